use clap::{Parser, ValueEnum};

/// Pointer-driven particle field
#[derive(Parser)]
#[command()]
pub struct Args {
    /// Particles spawned per pointer movement
    #[arg(short, long, default_value_t = 3)]
    pub burst: usize,

    /// Upper bound on live particles
    ///
    /// spawns beyond it are dropped, unbounded if not given
    #[arg(short, long)]
    pub max_particles: Option<usize>,

    /// Seed for particle sampling, random if not given
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Initial background theme [T toggles]
    #[arg(short, long, value_enum, default_value_t = Theme::Dark)]
    pub theme: Theme,

    /// Seconds between frame statistics in the debug log, 0 disables them
    #[arg(long, default_value_t = 5.0)]
    pub stats_interval: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn background(self) -> wgpu::Color {
        match self {
            // slate-50
            Theme::Light => wgpu::Color {
                r: 0.973,
                g: 0.980,
                b: 0.988,
                a: 1.0,
            },
            // slate-950
            Theme::Dark => wgpu::Color {
                r: 0.008,
                g: 0.024,
                b: 0.090,
                a: 1.0,
            },
        }
    }
}
