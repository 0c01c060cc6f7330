use colored::Colorize;
use parking_lot::Mutex;

// RGB tuple constants for use with the `colored` crate's `.truecolor()` method
pub mod rgb {
    pub const ELECTRIC_PURPLE: (u8, u8, u8) = (225, 53, 255);
    pub const NEON_CYAN: (u8, u8, u8) = (128, 255, 234);
    pub const DIM_WHITE: (u8, u8, u8) = (180, 180, 190);
}

/// Track quiet mode state
static QUIET_MODE: std::sync::LazyLock<Mutex<bool>> =
    std::sync::LazyLock::new(|| Mutex::new(false));

/// Enable or disable quiet mode
pub fn set_quiet_mode(enabled: bool) {
    let mut quiet_mode = QUIET_MODE.lock();
    *quiet_mode = enabled;
}

/// Check if quiet mode is enabled
pub fn is_quiet_mode() -> bool {
    *QUIET_MODE.lock()
}

pub fn print_info(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.cyan().bold());
    }
}

pub fn print_warning(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.yellow().bold());
    }
}

pub fn print_error(message: &str) {
    // Always print errors, even in quiet mode
    eprintln!("{}", message.red().bold());
}

pub fn print_success(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.green().bold());
    }
}

pub fn print_version(version: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::ELECTRIC_PURPLE;
        println!(
            "{} {} {}",
            "🌱 Git-Cadence".truecolor(r, g, b).bold(),
            "version".cyan(),
            version.green()
        );
    }
}

/// A labelled check line, as printed by `doctor`
pub fn print_check(label: &str, ok: bool, detail: &str) {
    if is_quiet_mode() && ok {
        return;
    }
    let mark = if ok { "✓".green().bold() } else { "✗".red().bold() };
    let (r, g, b) = rgb::DIM_WHITE;
    println!("{mark} {label:<12} {}", detail.truecolor(r, g, b));
}

/// Print content with decorative borders
pub fn print_bordered_content(content: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::NEON_CYAN;
        println!("{}", "━".repeat(50).truecolor(r, g, b));
        println!("{content}");
        println!("{}", "━".repeat(50).truecolor(r, g, b));
    }
}
