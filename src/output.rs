use owo_colors::OwoColorize;

/// Small wrapper around stdout/stderr printing to provide consistent, colored
/// user-facing messages. Colors are enabled only when output is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

const SEPARATOR_WIDTH: usize = 60;

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain user-facing line (no prefix).
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Banner closing a command that completed normally.
pub fn print_success_separator() {
    let line = "=".repeat(SEPARATOR_WIDTH);
    if is_tty() {
        println!("{}", line.green());
    } else {
        println!("{}", line);
    }
}

/// Banner closing a command that ended in an error.
pub fn print_exception_separator() {
    let line = "!".repeat(SEPARATOR_WIDTH);
    if is_tty() {
        eprintln!("{}", line.red().bold());
    } else {
        eprintln!("{}", line);
    }
}

/// Interactive prompt, no trailing newline.
pub fn print_prompt(prompt: &str) {
    use std::io::Write;
    if is_tty() {
        print!("{} ", prompt.bold());
    } else {
        print!("{} ", prompt);
    }
    let _ = std::io::stdout().flush();
}
