use super::models::{AppEvent, EventBus};
use colored::Colorize;
use std::sync::Arc;

impl EventBus {
    pub fn new(silent_mode: bool) -> Arc<Self> {
        Arc::new(Self { silent_mode })
    }

    pub fn is_silent(&self) -> bool {
        self.silent_mode
    }

    /// Prints the event to the console.
    ///
    /// Listing output and signed URLs are the command's result, so they are
    /// written to stdout even in silent mode. Everything else is status chatter
    /// and goes to stderr, which keeps `oss get KEY > file` usable.
    pub fn emit(&self, event: AppEvent) {
        match event {
            // Results
            AppEvent::KeyListed { key } => {
                println!("{}", key);
            }
            AppEvent::UrlGenerated { url, .. } => {
                println!("{}", url);
            }
            AppEvent::ExistsChecked { key, exists } => {
                if self.silent_mode {
                    return;
                }
                if exists {
                    eprintln!("  {} {}", "✓".green(), key.cyan());
                } else {
                    eprintln!("  {} {} not found", "✗".red(), key.cyan());
                }
            }

            // Errors are never silenced
            AppEvent::Error { context, error } => {
                tracing::error!("{}: {}", context, error);
                eprintln!("  {} {}: {}", "✗".red(), context, error.dimmed());
            }

            _ if self.silent_mode => {}

            // Application lifecycle
            AppEvent::Starting => {
                eprintln!("{} {}", "oss".white().bold(), env!("CARGO_PKG_VERSION").dimmed());
            }

            // Configuration
            AppEvent::ConfigLoading { path } => {
                eprintln!("  {} {}", "Loading config".dimmed(), path.cyan());
            }
            AppEvent::ConfigCreated { path } => {
                tracing::warn!("Configuration file not found");
                tracing::info!("Created default configuration at: {}", path);
            }
            AppEvent::ConfigMigrated { changes } => {
                if !changes.is_empty() {
                    eprintln!("  {} Config updated: {}", "↻".blue(), changes.join(", ").dimmed());
                }
            }
            AppEvent::ConfigLoaded { provider } => {
                eprintln!("  {} provider {}", "✓".green(), provider.cyan());
            }

            // Store
            AppEvent::StoreReady { provider, location } => {
                tracing::debug!("{} store ready at {}", provider, location);
                eprintln!("  {} {}", "→".dimmed(), location.blue());
            }

            // Operations
            AppEvent::ListCompleted { count } => {
                eprintln!("  {} {} key(s)", "✓".green(), count.to_string().cyan());
            }
            AppEvent::Uploaded { key, source } => {
                eprintln!("  {} {} {} {}", "↑".green(), source.dimmed(), "→".dimmed(), key.cyan());
            }
            AppEvent::Downloaded { key, target } => {
                eprintln!("  {} {} {} {}", "↓".green(), key.cyan(), "→".dimmed(), target.dimmed());
            }
            AppEvent::Deleted { key } => {
                eprintln!("  {} Deleted {}", "-".red(), key.cyan());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_flag() {
        assert!(EventBus::new(true).is_silent());
        assert!(!EventBus::new(false).is_silent());
    }

    #[test]
    fn test_emit_in_silent_mode_does_not_panic() {
        let bus = EventBus::new(true);
        bus.emit(AppEvent::Starting);
        bus.emit(AppEvent::ListCompleted { count: 3 });
        bus.emit(AppEvent::Deleted { key: "txt/test.txt".to_string() });
    }
}
