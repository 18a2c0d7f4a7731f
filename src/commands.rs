//! CLI commands for Reward Rotor
//! 
//! Drives controllers against the simulated ad SDK and manages the
//! configuration file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use reward_rotor_ads::{BusListener, RewardController, SimulatedSdk, SimulatedSurface, SimulationProfile};
use reward_rotor_core::{AdEvent, AdFormat, AppConfig, EventBus};

/// Outcome counts of a simulation run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Displays requested by the run
    pub requested: u32,
    /// Rewards granted
    pub rewarded: u32,
    /// Displays closed without reward
    pub unrewarded: u32,
    /// Display failures reported to the listener
    pub show_failures: u32,
    /// Slot loads that failed and were retried
    pub load_failures: u32,
}

impl SimulationSummary {
    /// Tally listener events
    pub fn from_events<'a>(requested: u32, events: impl IntoIterator<Item = &'a AdEvent>) -> Self {
        let mut summary = Self { requested, ..Self::default() };
        for event in events {
            match event {
                AdEvent::RewardEarned { earned: true, .. } => summary.rewarded += 1,
                AdEvent::RewardEarned { earned: false, .. } => summary.unrewarded += 1,
                AdEvent::AdShowFailed { .. } => summary.show_failures += 1,
                AdEvent::AdLoadFailed { .. } => summary.load_failures += 1,
                _ => {}
            }
        }
        summary
    }
}

/// Simulate command options
pub struct SimulateCommand {
    /// Ad format to drive
    pub format: AdFormat,
    /// Number of display requests
    pub shows: u32,
    /// Pause between display requests
    pub interval: Duration,
    /// Simulated network behaviour
    pub profile: SimulationProfile,
}

impl SimulateCommand {
    /// Run the simulation
    pub async fn execute(&self, config: &AppConfig) -> Result<SimulationSummary> {
        let reward_config = config
            .reward(self.format)
            .cloned()
            .with_context(|| format!("[{}] is not configured", self.format))?;

        info!(
            "Simulating {} display(s) of {} ads on {}",
            self.shows, self.format, reward_config.ad_unit_id
        );

        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let sdk = SimulatedSdk::new(self.profile.clone());
        let listener = Arc::new(BusListener::new(self.format, Arc::clone(&bus)));

        let (controller, handle) = RewardController::spawn(reward_config, sdk, listener)?;
        controller.attach_surface(SimulatedSurface::new("simulator"))?;
        controller.start()?;

        let mut seen = Vec::new();
        for round in 1..=self.shows {
            tokio::time::sleep(self.interval).await;
            info!(
                "Round {}: {} ad(s) ready, requesting display",
                round,
                controller.loaded_ad_count()
            );
            controller.show_ad()?;
            seen.extend(log_events(&events));
        }

        tokio::time::sleep(self.interval).await;
        controller.shutdown();
        handle.await.context("controller loop panicked")?;
        seen.extend(log_events(&events));

        let summary = SimulationSummary::from_events(self.shows, &seen);
        info!("Simulation finished: {:?}", summary);
        Ok(summary)
    }
}

fn log_events(events: &reward_rotor_core::EventSubscription) -> Vec<AdEvent> {
    let drained = events.drain();
    for event in &drained {
        info!("  {:?}", event);
    }
    drained
}

/// Config command options
pub struct ConfigCommand {
    /// Where to write the default configuration
    pub path: Option<PathBuf>,
    /// Print instead of writing
    pub print: bool,
}

impl ConfigCommand {
    /// Write or print the default configuration
    pub async fn execute(&self) -> Result<Option<PathBuf>> {
        let config = AppConfig::default();
        if self.print {
            println!("{}", toml::to_string_pretty(&config)?);
            return Ok(None);
        }

        let path = match &self.path {
            Some(path) => path.clone(),
            None => AppConfig::config_file().context("cannot determine config path")?,
        };
        config.save_to(&path).await?;
        info!("Default configuration written to {:?}", path);
        Ok(Some(path))
    }
}

/// Print the SHA-256 digest of a string
pub struct Sha256Command {
    /// Text to hash
    pub input: String,
}

impl Sha256Command {
    /// Print the lowercase hex digest
    pub fn execute(&self) -> String {
        let digest = reward_rotor_core::util::sha256_hex(&self.input);
        println!("{}", digest);
        digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let format = AdFormat::Rewarded;
        let events = vec![
            AdEvent::RewardEarned { format, earned: true },
            AdEvent::AdDismissed { format },
            AdEvent::RewardEarned { format, earned: false },
            AdEvent::AdShowFailed { format, message: "x".into() },
            AdEvent::AdLoadFailed { format, slot: reward_rotor_core::SlotId::B, message: "No fill.".into() },
        ];
        let summary = SimulationSummary::from_events(3, &events);
        assert_eq!(
            summary,
            SimulationSummary {
                requested: 3,
                rewarded: 1,
                unrewarded: 1,
                show_failures: 1,
                load_failures: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_grants_rewards() {
        let command = SimulateCommand {
            format: AdFormat::Rewarded,
            shows: 2,
            interval: Duration::from_secs(2),
            profile: SimulationProfile {
                fail_every_nth_load: 0,
                fail_every_nth_show: 0,
                skip_every_nth_show: 0,
                ..SimulationProfile::default()
            },
        };
        let summary = command.execute(&AppConfig::default()).await.unwrap();
        assert_eq!(summary.rewarded, 2);
        assert_eq!(summary.unrewarded, 0);
    }

    #[tokio::test]
    async fn test_missing_section_rejected() {
        let mut config = AppConfig::default();
        config.rewarded_interstitial = None;
        let command = SimulateCommand {
            format: AdFormat::RewardedInterstitial,
            shows: 1,
            interval: Duration::from_millis(1),
            profile: SimulationProfile::default(),
        };
        assert!(command.execute(&config).await.is_err());
    }

    #[test]
    fn test_sha256_command() {
        let command = Sha256Command { input: "abc".into() };
        assert_eq!(
            command.execute(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
