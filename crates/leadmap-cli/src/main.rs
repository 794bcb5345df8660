// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use leadmap_core::backend::{MarkerStyle, MemoryBackend};
use leadmap_core::cluster::cluster_points;
use leadmap_core::filter::LeadFilter;
use leadmap_core::geo::ContainerSize;
use leadmap_core::lead::{load_leads, merge_discovered};
use leadmap_core::popup::popup_html;
use leadmap_core::projection::{
    project, to_feature_collection, PipelineStage, GHOST_COLOR, UNASSIGNED_COLOR,
};
use leadmap_core::surface::LayerToggles;
use leadmap_core::{EngineConfig, Lead, MapControl, RenderSurface, SurfaceCallbacks};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine config file (JSON). Defaults to the per-user config directory.
    #[arg(short, long, env = "LEADMAP_CONFIG")]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Pipeline status ("all" disables)
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    min_value: Option<f64>,
    #[arg(long)]
    sector: Option<String>,
    #[arg(long)]
    region: Option<String>,
    /// Free-text search over company, contact, city, address, email, sector and tags
    #[arg(long)]
    search: Option<String>,
}

impl From<FilterArgs> for LeadFilter {
    fn from(args: FilterArgs) -> Self {
        LeadFilter {
            status: args.status,
            min_value: args.min_value,
            sector: args.sector,
            region: args.region,
            search: args.search,
        }
    }
}

#[derive(Args, Debug)]
struct Source {
    /// CRM leads (JSON array)
    leads: PathBuf,
    /// Discovery results merged after the CRM leads
    #[arg(long)]
    discovered: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the visible leads as a GeoJSON FeatureCollection
    Project {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the popup markup for one feature id
    Popup {
        #[command(flatten)]
        source: Source,
        feature_id: String,
    },
    /// Mount a headless map surface and report what it rendered
    Simulate {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        filter: FilterArgs,
        /// Render plain markers instead of clusters
        #[arg(long)]
        no_clusters: bool,
        #[arg(long)]
        heatmap: bool,
        /// Externally selected feature id
        #[arg(long)]
        select: Option<String>,
        /// Feature id to click after rendering
        #[arg(long)]
        click: Option<String>,
        /// Fit the camera to every known lead, not just the visible ones
        #[arg(long)]
        fit_all: bool,
        #[arg(long, default_value_t = 1024.0)]
        width: f64,
        #[arg(long, default_value_t = 768.0)]
        height: f64,
    },
    /// Show the status color legend
    Colors,
}

fn init_logging(verbose: u8) {
    let level = std::env::var("LEADMAP_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        });
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn load_source(source: &Source) -> Result<Vec<Lead>> {
    let crm = load_leads(&source.leads)?;
    match &source.discovered {
        Some(path) => {
            let discovered = load_leads(path)?;
            let merged = merge_discovered(&crm, &discovered);
            log::info!(
                "[CLI] {} CRM leads + {} new from discovery",
                crm.len(),
                merged.len() - crm.len()
            );
            Ok(merged)
        }
        None => Ok(crm),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(EngineConfig::default_path);
    EngineConfig::load(&path).with_context(|| format!("Failed to load config {:?}", path))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Project { source, filter } => {
            let leads = load_source(&source)?;
            let visible = LeadFilter::from(filter).apply(&leads);
            let fc = to_feature_collection(&visible);
            println!("{}", serde_json::to_string_pretty(&fc)?);
        }
        Commands::Popup { source, feature_id } => {
            let leads = load_source(&source)?;
            let points = project(&leads);
            let point = points
                .iter()
                .find(|p| p.feature_id == feature_id)
                .ok_or_else(|| anyhow::anyhow!("No plottable lead with feature id '{}'", feature_id))?;
            println!("{}", popup_html(&point.lead, &point.feature_id));
        }
        Commands::Simulate {
            source,
            filter,
            no_clusters,
            heatmap,
            select,
            click,
            fit_all,
            width,
            height,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let leads = load_source(&source)?;
            let visible = LeadFilter::from(filter).apply(&leads);
            simulate(
                config,
                &leads,
                &visible,
                LayerToggles {
                    show_heatmap: heatmap,
                    show_clusters: !no_clusters,
                },
                select.as_deref(),
                click.as_deref(),
                fit_all,
                ContainerSize::new(width, height),
            );
        }
        Commands::Colors => {
            for stage in PipelineStage::ALL {
                println!("{:<12} {}", stage.key(), stage.color());
            }
            println!("{:<12} {}", "unassigned", UNASSIGNED_COLOR);
            println!("{:<12} {}", "no id", GHOST_COLOR);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn simulate(
    config: EngineConfig,
    all: &[Lead],
    visible: &[Lead],
    toggles: LayerToggles,
    select: Option<&str>,
    click: Option<&str>,
    fit_all: bool,
    size: ContainerSize,
) {
    let cluster_radius = config.cluster_radius_px;
    let mut surface = RenderSurface::mount(
        MemoryBackend::new(size),
        config,
        SurfaceCallbacks {
            on_select: Some(Box::new(|lead: &Lead, id: &str| {
                println!("selected: {} ({})", id, lead.display_name());
            })),
            ..Default::default()
        },
    );
    let frames: Vec<_> = surface.backend().pending_frames.iter().copied().collect();
    for frame in frames {
        surface.on_animation_frame(frame);
    }

    surface.set_selected_id(select);
    surface.set_data(visible, toggles);
    if let Some(id) = click {
        surface.handle_marker_click(id);
    }
    if fit_all {
        surface.fit_to_leads(all);
    } else {
        surface.fit_to_data();
    }

    let view = surface.backend().current_view;
    println!("phase:     {:?}", surface.phase());
    println!("leads:     {} visible of {}", visible.len(), all.len());
    println!("points:    {}", surface.points().len());
    println!("layer:     {:?}", surface.attached_layer());
    println!("selected:  {}", surface.selected_feature_id().unwrap_or("-"));
    println!("heat:      {:?}", surface.heat_mode());
    println!(
        "view:      {:.4}, {:.4} @ z{}",
        view.center.lat, view.center.lng, view.zoom
    );

    if toggles.show_clusters {
        let clusters = cluster_points(surface.points(), view.zoom, cluster_radius);
        println!("clusters:  {}", clusters.len());
        for cluster in clusters.iter().filter(|c| !c.is_single()) {
            println!(
                "  {:>4} near {:.4}, {:.4}",
                cluster.count(),
                cluster.center.lat,
                cluster.center.lng
            );
        }
    }

    for marker in &surface.backend().markers {
        let mark = if marker.spec.style == MarkerStyle::Selected {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<24} {} {}",
            mark, marker.spec.feature_id, marker.spec.color, marker.spec.tooltip
        );
    }

    surface.unmount();
}
