use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // Any argument at all is a request for help
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
    // Only list variables that can never hold a secret
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "CDP_HOST",
        "CDP_PORT",
        "CDP_DATABASE_URL",
        "CDP_SESSION_COOKIE",
        "CDP_SECURE_COOKIES",
        "CDP_USE_X_FORWARDED_FOR",
        "CDP_USE_FORWARDED",
        "CDP_RAZORPAY_IP_WHITELIST",
        "RAZORPAY_KEY_ID",
        "RAZORPAY_API_URL",
        "SUPABASE_URL",
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
