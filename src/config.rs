use clap::Parser;

/// Football match probability and value-detection service
#[derive(Parser, Debug, Clone)]
#[command(name = "matchedge", version, about)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: String,

    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "matchedge.db")]
    pub database_path: String,

    /// API-FOOTBALL base URL
    #[arg(
        long,
        env = "APISPORTS_BASE",
        default_value = "https://v3.football.api-sports.io"
    )]
    pub apisports_base: String,

    /// API-FOOTBALL key (fixture/odds lookups are disabled without it)
    #[arg(long, env = "APISPORTS_KEY")]
    pub apisports_key: Option<String>,

    /// League average goals per match used for the expected-goals prior
    #[arg(long, env = "LEAGUE_AVG_GOALS", default_value = "2.6")]
    pub league_avg_goals: f64,

    /// Scoreline matrix size: goals per side are tracked up to this count
    #[arg(long, env = "MAX_GOALS", default_value = "10")]
    pub max_goals: usize,

    /// Minimum best edge for a pick to be promoted (e.g. 0.05 = 5pp)
    #[arg(long, env = "MIN_EDGE", default_value = "0.05")]
    pub min_edge: f64,

    /// Best edge below this marks the market as efficient
    #[arg(long, env = "EFFICIENCY_THRESHOLD", default_value = "0.03")]
    pub efficiency_threshold: f64,

    /// Dixon-Coles correlation for ordinary fixtures
    #[arg(long, env = "RHO_BASE", default_value = "0.02")]
    pub rho_base: f64,

    /// Dixon-Coles correlation for high-intensity fixtures
    #[arg(long, env = "RHO_HIGH_INTENSITY", default_value = "0.05")]
    pub rho_high_intensity: f64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.league_avg_goals <= 0.0 {
            anyhow::bail!("league_avg_goals must be positive");
        }
        if self.max_goals == 0 || self.max_goals > 30 {
            anyhow::bail!("max_goals must be between 1 and 30");
        }
        if !(0.0..=1.0).contains(&self.min_edge) {
            anyhow::bail!("min_edge must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.efficiency_threshold) {
            anyhow::bail!("efficiency_threshold must be between 0.0 and 1.0");
        }
        for (name, rho) in [
            ("rho_base", self.rho_base),
            ("rho_high_intensity", self.rho_high_intensity),
        ] {
            if !(0.0..=0.1).contains(&rho) {
                anyhow::bail!("{name} must be between 0.0 and 0.1");
            }
        }
        Ok(())
    }

    pub fn engine_params(&self) -> crate::engine::EngineParams {
        crate::engine::EngineParams {
            league_avg_goals: self.league_avg_goals,
            max_goals: self.max_goals,
            min_edge: self.min_edge,
            efficiency_threshold: self.efficiency_threshold,
            rho_base: self.rho_base,
            rho_high_intensity: self.rho_high_intensity,
        }
    }
}
