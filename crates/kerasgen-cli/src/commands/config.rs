//! Config command implementation.

use kerasgen_ops::Config;

/// Show the resolved configuration.
pub fn show(config: &Config) {
    println!("kerasgen Configuration");
    println!("{:-<40}", "");

    for (key, value) in config.entries() {
        let value = if value.is_empty() {
            "(not set)".to_string()
        } else {
            value
        };
        println!("{:<24} {}", key, value);
    }

    if let Some(path) = Config::user_config_path() {
        println!("\nConfig file: {}", path.display());
    }
}

/// Print the per-user config file path.
pub fn path() {
    match Config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("(no config directory on this platform)"),
    }
}
