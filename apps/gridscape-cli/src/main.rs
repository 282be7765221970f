use clap::{Parser, Subcommand, ValueEnum};
use gridscape_common::FrameState;
use gridscape_mesh::{PlaneSpec, plane, remap_to_ground};
use gridscape_render::{ContextLimits, HeadlessContext, LIGHT_COUNT, terrain, terrain_descriptor};
use gridscape_shader::{ShaderDef, ShaderLibrary, TERRAIN_DEFINES, TerrainShaders};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridscape-cli", about = "Inspect the terrain sketch without a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate the ground grid and report its size and bounds
    Mesh {
        /// Quads along each side of the grid
        #[arg(short, long, default_value = "250")]
        subdivisions: u32,
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a composed shader stage
    Shader {
        #[arg(value_enum)]
        stage: Stage,
        /// Override a terrain tunable, e.g. `-D TERRAIN_SPEED=0.1` or `-D FOG=false`
        #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_define)]
        defines: Vec<(String, ShaderDef)>,
    },
    /// Resolve the terrain uniforms at a point in time, as JSON
    Uniforms {
        /// Elapsed seconds
        #[arg(short, long, default_value = "0.0")]
        time: f32,
    },
    /// Build the terrain draw on the headless backend and describe one frame
    Frame {
        /// Elapsed seconds
        #[arg(short, long, default_value = "0.0")]
        time: f32,
        /// Frame counter
        #[arg(long, default_value = "0")]
        tick: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    Vertex,
    Fragment,
}

fn parse_define(arg: &str) -> Result<(String, ShaderDef), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{arg}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing define name in `{arg}`"));
    }
    let def = value.parse::<ShaderDef>().map_err(|e| e.to_string())?;
    Ok((name.to_string(), def))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("gridscape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("mesh: {}", gridscape_mesh::crate_info());
            println!("shader: {}", gridscape_shader::crate_info());
            println!("render: {}", gridscape_render::crate_info());
            println!("lights: {LIGHT_COUNT}");

            let chunks: Vec<_> = ShaderLibrary::standard()
                .chunks()
                .map(|(name, _)| name)
                .collect();
            println!("shader chunks: {}", chunks.join(", "));
            for (name, def) in TERRAIN_DEFINES {
                println!("tunable: {name} = {def:?}");
            }

            let descriptor = terrain_descriptor(&ContextLimits::default())?;
            let uniforms: Vec<_> = descriptor.uniforms.names().collect();
            println!("uniforms: {}", uniforms.join(", "));
        }
        Commands::Mesh { subdivisions, json } => {
            let spec = PlaneSpec::new(1.0, 1.0, subdivisions, subdivisions);
            let mut mesh = plane(&spec)?;
            remap_to_ground(&mut mesh);
            mesh.validate()?;
            let stats = mesh.stats();
            tracing::debug!(?stats, "generated ground grid");

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "Ground grid {subdivisions}x{subdivisions}: {} vertices, {} triangles",
                    stats.vertices, stats.triangles
                );
                println!(
                    "Bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                    stats.min.x, stats.min.y, stats.min.z, stats.max.x, stats.max.y, stats.max.z
                );
            }
        }
        Commands::Shader { stage, defines } => {
            let shaders = TerrainShaders::compose_with(LIGHT_COUNT, &defines)?;
            let source = match stage {
                Stage::Vertex => shaders.vertex,
                Stage::Fragment => shaders.fragment,
            };
            print!("{source}");
        }
        Commands::Uniforms { time } => {
            let descriptor = terrain_descriptor(&ContextLimits::default())?;
            let resolved = descriptor.uniforms.resolve(&FrameState::at(time));
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Frame { time, tick } => {
            let mut ctx = HeadlessContext::new();
            let draw = terrain(&mut ctx)?;
            print!("{}", draw.draw(&FrameState { time, tick }));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shader_stage() {
        let cli = Cli::parse_from(["gridscape-cli", "shader", "fragment"]);
        assert!(matches!(
            cli.command,
            Commands::Shader {
                stage: Stage::Fragment,
                ref defines,
            } if defines.is_empty()
        ));
    }

    #[test]
    fn shader_defines_parse() {
        let cli = Cli::parse_from([
            "gridscape-cli",
            "shader",
            "vertex",
            "-D",
            "TERRAIN_SPEED=0.1",
            "--define",
            "FOG=false",
        ]);
        let Commands::Shader { defines, .. } = cli.command else {
            panic!("expected shader command");
        };
        assert_eq!(
            defines,
            vec![
                ("TERRAIN_SPEED".to_string(), ShaderDef::F32(0.1)),
                ("FOG".to_string(), ShaderDef::Bool(false)),
            ]
        );
        assert!(TerrainShaders::compose_with(LIGHT_COUNT, &defines).is_ok());
    }

    #[test]
    fn malformed_defines_rejected() {
        assert!(parse_define("TERRAIN_SPEED").is_err());
        assert!(parse_define("=1.0").is_err());
        assert!(parse_define("FOG=maybe").is_err());
        assert!(Cli::try_parse_from(["gridscape-cli", "shader", "vertex", "-D", "FOG"]).is_err());
    }

    #[test]
    fn infinite_define_fails_to_compose() {
        let define = parse_define("TERRAIN_SPEED=inf").unwrap();
        assert!(TerrainShaders::compose_with(LIGHT_COUNT, &[define]).is_err());
    }

    #[test]
    fn mesh_defaults_to_terrain_resolution() {
        let cli = Cli::parse_from(["gridscape-cli", "mesh", "--json"]);
        let Commands::Mesh { subdivisions, json } = cli.command else {
            panic!("expected mesh command");
        };
        assert_eq!(subdivisions, PlaneSpec::TERRAIN.subdivisions_x);
        assert!(json);
    }

    #[test]
    fn uniforms_take_a_time() {
        let cli = Cli::parse_from(["gridscape-cli", "-v", "uniforms", "--time", "3.5"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Uniforms { time } if time == 3.5));
    }
}
