//! CLI command implementations

use crate::headless::{HeadlessSurface, Journal, ScriptedEngineFactory};
use crate::output::{print_json, styled_status, OutputFormat};
use relay_player_core::{
    strategy, CanPlay, CapabilityProbe, EngineEvent, PlaybackStrategy, PlayerConfig,
    RecoveryState, SessionController, Status, UrlResolver,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tabled::{Table, Tabled};

/// Surface capability fixed from the command line
struct FixedCapability(CanPlay);

impl CapabilityProbe for FixedCapability {
    fn supports_native_adaptive_playback(&self) -> bool {
        self.0.is_supported()
    }
}

#[derive(Serialize)]
struct Resolution {
    input: String,
    relay_url: String,
    upstream: String,
}

/// Show the relay URL for a stream URL
pub fn resolve(config: &PlayerConfig, raw_url: &str, format: &str) -> anyhow::Result<()> {
    let resolver = UrlResolver::new(config.relay_prefix.clone());
    let target = resolver.resolve(raw_url)?;
    let upstream = resolver.decode_relay_url(&target.relay_url)?;

    let resolution = Resolution {
        input: raw_url.to_string(),
        relay_url: target.relay_url,
        upstream: upstream.to_string(),
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&resolution)?,
        OutputFormat::Text | OutputFormat::Table => {
            println!("Relay URL: {}", resolution.relay_url);
            println!("  Upstream: {}", resolution.upstream);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct Plan {
    url: String,
    relay_url: String,
    native: CanPlay,
    strategy: PlaybackStrategy,
    uses_engine: bool,
}

/// Show which playback strategy a URL gets
pub fn plan(config: &PlayerConfig, raw_url: &str, native: CanPlay, format: &str) -> anyhow::Result<()> {
    let resolver = UrlResolver::new(config.relay_prefix.clone());
    let target = resolver.resolve(raw_url)?;
    let chosen = strategy::select(raw_url, &target, &FixedCapability(native));

    let plan = Plan {
        url: raw_url.to_string(),
        relay_url: target.relay_url,
        native,
        strategy: chosen,
        uses_engine: chosen.uses_engine(),
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&plan)?,
        OutputFormat::Text | OutputFormat::Table => {
            println!("Strategy: {}", plan.strategy);
            println!("  Relay URL: {}", plan.relay_url);
            println!("  Native HLS: {}", plan.native);
            println!("  Adaptive engine: {}", if plan.uses_engine { "yes" } else { "no" });
        }
    }
    Ok(())
}

#[derive(Serialize, Tabled)]
struct PresetRow {
    name: String,
    url: String,
    configured: bool,
}

/// List configured presets
pub fn presets(config: &PlayerConfig, format: &str) -> anyhow::Result<()> {
    let rows: Vec<PresetRow> = config
        .presets
        .keys()
        .map(|name| {
            let url = config.preset_url(name);
            PresetRow {
                name: name.clone(),
                url: url.unwrap_or("").to_string(),
                configured: url.is_some(),
            }
        })
        .collect();

    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => println!("{}", Table::new(&rows)),
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No presets configured.");
            }
            for row in &rows {
                if row.configured {
                    println!("  {} - {}", row.name, row.url);
                } else {
                    println!("  {} - (not configured)", row.name);
                }
            }
        }
    }
    Ok(())
}

/// What a simulation plays
pub enum Source {
    Url(String),
    Preset(String),
}

/// Events used when no timeline file is given
pub fn default_timeline() -> Vec<EngineEvent> {
    vec![
        EngineEvent::ManifestParsed,
        EngineEvent::LevelLoaded { live: true },
    ]
}

#[derive(Serialize)]
struct Step {
    step: String,
    calls: Vec<String>,
    state: RecoveryState,
    status: Status,
    engine_active: bool,
}

/// Run a session against the headless surface and a scripted engine
pub fn simulate(
    config: PlayerConfig,
    source: Source,
    timeline: Vec<EngineEvent>,
    native: CanPlay,
    block_autoplay: bool,
    format: &str,
) -> anyhow::Result<()> {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let surface = HeadlessSurface::new(journal.clone(), native, block_autoplay);
    let factory = ScriptedEngineFactory::new(journal.clone());
    let mut controller = SessionController::new(config, surface, factory);

    let mut steps = Vec::new();
    let mut seen = 0;
    let mut snapshot = |name: String, controller: &SessionController<HeadlessSurface, ScriptedEngineFactory>| {
        let calls = journal.borrow()[seen..].to_vec();
        seen += calls.len();
        Step {
            step: name,
            calls,
            state: controller.state(),
            status: controller.status().current(),
            engine_active: controller.engine_active(),
        }
    };

    let (label, started) = match &source {
        Source::Url(url) => (format!("play {url}"), controller.play_input(url)),
        Source::Preset(name) => (format!("preset {name}"), controller.play_preset(name)),
    };
    steps.push(snapshot(label, &controller));

    if started.is_some() && controller.engine_active() {
        for event in timeline {
            let label = serde_json::to_string(&event)?;
            match controller.factory().sink() {
                Some(sink) => sink.emit(event),
                None => break,
            }
            controller.pump_events();
            steps.push(snapshot(label, &controller));
        }
    }

    controller.teardown();
    steps.push(snapshot("teardown".to_string(), &controller));

    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&steps)?,
        OutputFormat::Text | OutputFormat::Table => {
            for step in &steps {
                println!("▶ {}", step.step);
                for call in &step.calls {
                    println!("    {}", call);
                }
                println!("    state: {}  engine: {}", step.state, step.engine_active);
                println!("    status: {}", styled_status(&step.status));
            }
        }
    }
    Ok(())
}
