// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
             _
  __ _  __ _| |_     ___  ___ _ ____   _____ _ __
 / _` |/ _` | __|   / __|/ _ \ '__\ \ / / _ \ '__|
| (_| | (_| | |_    \__ \  __/ |   \ V /  __/ |
 \__, |\__,_|\__|   |___/\___|_|    \_/ \___|_|
    |_|

    Releases, commits and the online compiler for qat.dev
"#;
    println!("{}", banner);
}
