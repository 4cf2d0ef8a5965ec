//! Config check command handler

use crate::config::Config;

pub fn cmd_check(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    println!("Configuration OK");
    println!("{:-<50}", "");
    print!("{}", toml::to_string_pretty(&config.masked())?);
    println!("{:-<50}", "");

    if config.supabase.is_enabled() {
        println!("Persistence: Supabase at {}", config.supabase.url);
    } else {
        println!("Persistence: disabled (set SUPABASE_URL and SUPABASE_KEY to enable)");
    }

    Ok(())
}
