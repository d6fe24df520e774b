//! `courier check`: validate the configuration without starting the bot.

use courier_config::CourierConfig;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn check(config: &CourierConfig) -> anyhow::Result<()> {
    match config.validate() {
        Ok(()) => {
            eprintln!("{BOLD}{GREEN}ok{RESET} configuration is valid");
            eprintln!("  interface:    {:?}", config.interface.kind);
            eprintln!("  orchestrator: {:?}", config.orchestrator.kind);
            eprintln!("  sessions:     {:?}", config.sessions.backend);
            eprintln!("  models:       {}", config.models.len());
            Ok(())
        },
        Err(e) => {
            for problem in &e.problems {
                eprintln!("  {BOLD}{RED}error{RESET} {problem}");
            }
            eprintln!("\n{} error(s)", e.problems.len());
            Err(e.into())
        },
    }
}
