use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "CHECKOUT_HOST",
        "CHECKOUT_PORT",
        "CHECKOUT_DATABASE_URL",
        "CHECKOUT_RUN_MIGRATIONS",
        "CHECKOUT_DEFAULT_DELIVERY_FEE",
        "CHECKOUT_UNPAID_ORDER_TIMEOUT",
        "CHECKOUT_USE_X_FORWARDED_FOR",
        "CHECKOUT_USE_FORWARDED",
        "CHECKOUT_PAYSTACK_BASE_URL",
        "CHECKOUT_PAYSTACK_MOMO_PROVIDER",
        "CHECKOUT_PAYSTACK_TIMEOUT_SECS",
        "CHECKOUT_PAYSTACK_IP_WHITELIST",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
