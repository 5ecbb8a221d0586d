use std::env;
use std::path::{Path, PathBuf};

use iso_engine::{
    load_game_file, resolve_app_paths, AppError, GameSession, JsonFileStore, LoopConfig,
    SimulationConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const GAME_FILE_ENV_VAR: &str = "ISOQUEST_GAME";
const SEED_ENV_VAR: &str = "ISOQUEST_SEED";
const DEFAULT_GAME_FILE: &str = "assets/game.xml";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: GameSession,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== IsoQuest Startup ===");

    let paths = resolve_app_paths()?;
    let game_file = resolve_game_file(
        &paths.root,
        env::args().nth(1),
        env::var(GAME_FILE_ENV_VAR).ok(),
    );
    let rng_seed = parse_seed(env::var(SEED_ENV_VAR).ok().as_deref());
    info!(
        root = %paths.root.display(),
        game_file = %game_file.display(),
        saves_dir = %paths.saves_dir.display(),
        rng_seed = ?rng_seed,
        "startup"
    );

    let game = load_game_file(&game_file)?;
    let store = JsonFileStore::new(&paths.saves_dir);
    let simulation_config = SimulationConfig {
        rng_seed,
        ..SimulationConfig::default()
    };
    let mut session = GameSession::new(game, paths.root, Box::new(store), simulation_config)?;
    session.start()?;

    Ok(AppWiring {
        config: LoopConfig::default(),
        session,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// CLI argument, then env var, then the bundled game. Relative paths are
/// taken from the project root.
fn resolve_game_file(root: &Path, cli_arg: Option<String>, env_value: Option<String>) -> PathBuf {
    let chosen = cli_arg
        .or(env_value)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| DEFAULT_GAME_FILE.to_string());
    let path = PathBuf::from(chosen);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

fn parse_seed(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    match raw.parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(_) => {
            warn!(
                env_var = SEED_ENV_VAR,
                value = raw,
                "invalid seed env var value; using entropy"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_file_prefers_cli_then_env_then_default() {
        let root = Path::new("/srv/isoquest");
        assert_eq!(
            resolve_game_file(root, Some("mods/alt.xml".into()), Some("env.xml".into())),
            root.join("mods/alt.xml")
        );
        assert_eq!(
            resolve_game_file(root, None, Some("env.xml".into())),
            root.join("env.xml")
        );
        assert_eq!(
            resolve_game_file(root, None, Some("  ".into())),
            root.join(DEFAULT_GAME_FILE)
        );
        assert_eq!(resolve_game_file(root, None, None), root.join(DEFAULT_GAME_FILE));
    }

    #[test]
    fn absolute_game_file_is_kept() {
        let absolute = std::env::temp_dir().join("game.xml");
        assert_eq!(
            resolve_game_file(
                Path::new("/srv/isoquest"),
                Some(absolute.display().to_string()),
                None
            ),
            absolute
        );
    }

    #[test]
    fn seed_parses_or_falls_back_to_entropy() {
        assert_eq!(parse_seed(Some(" 42 ")), Some(42));
        assert_eq!(parse_seed(Some("forty-two")), None);
        assert_eq!(parse_seed(None), None);
    }
}
