//! Run configuration, loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration:
//! ```toml
//! tolerance = 1e-9
//! snapshots = [0, 1, 2, 5, 10, 15, 20]
//! outdir = "output/edgemotion"
//!
//! [lattice]
//! n = 13
//! ly = 50
//!
//! [couplings]
//! j = 1.0
//! j_prime = 0.1
//!
//! [sweep]
//! num_ky = 100
//!
//! [[regimes]]
//! label = "anomalous"
//! period_pi = 1.5
//! periods = 22
//!
//! [[regimes]]
//! label = "haldane"
//! period_pi = 0.5
//! periods = 22
//! ```

use std::{ f64::consts::PI, path::{ Path, PathBuf } };
use ndarray as nd;
use rustc_hash::FxHashSet;
use serde::{ Deserialize, Serialize };
use crate::{
    eigu::DEF_TOL,
    error::{ FloquetError, FloquetResult, positive },
    floquet::{ Couplings, UBuilder },
    lattice::Lattice,
    propagation::EdgeSimulator,
    sweep::brillouin_zone,
};

const DEF_PERIODS: usize = 22;

fn def_periods() -> usize { DEF_PERIODS }

/// Lattice dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatticeConfig {
    /// Number of four-site unit cells along the driven direction.
    pub n: usize,
    /// Number of sites along the transverse direction.
    pub ly: usize,
}

impl Default for LatticeConfig {
    fn default() -> Self { Self { n: 13, ly: 50 } }
}

/// Hopping strengths.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CouplingConfig {
    pub j: f64,
    pub j_prime: f64,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        let Couplings { j, j_prime } = Couplings::default();
        Self { j, j_prime }
    }
}

impl From<CouplingConfig> for Couplings {
    fn from(c: CouplingConfig) -> Self { Couplings::new(c.j, c.j_prime) }
}

/// Momentum grid for the quasienergy sweep.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Number of momenta evenly spaced over `[-π, π]`.
    pub num_ky: usize,
}

impl Default for SweepConfig {
    fn default() -> Self { Self { num_ky: 100 } }
}

/// A driving regime: a driving period and the number of periods to simulate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Regime {
    /// Name used for output files.
    pub label: String,
    /// Driving period in units of π.
    pub period_pi: f64,
    /// Number of stroboscopic time steps.
    #[serde(default = "def_periods")]
    pub periods: usize,
}

impl Regime {
    pub fn new(label: &str, period_pi: f64, periods: usize) -> Self {
        Self { label: label.to_string(), period_pi, periods }
    }

    /// `T = 3π/2`.
    pub fn anomalous() -> Self { Self::new("anomalous", 1.5, DEF_PERIODS) }

    /// `T = 3π/6`.
    pub fn haldane() -> Self { Self::new("haldane", 0.5, DEF_PERIODS) }

    /// Driving period `T`.
    pub fn period(&self) -> f64 { self.period_pi * PI }

    fn validate(&self) -> FloquetResult<()> {
        if self.label.trim().is_empty() {
            return Err(FloquetError::Config("regime label must be non-empty".into()));
        }
        positive("driving period", self.period_pi)?;
        if self.periods == 0 {
            return Err(FloquetError::NonPositive {
                what: "number of periods", value: 0.0 });
        }
        Ok(())
    }
}

/// Top-level run configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Degeneracy tolerance for the unitary diagonalizer.
    pub tolerance: f64,
    /// Time-step indices selected for display.
    pub snapshots: Vec<usize>,
    pub outdir: PathBuf,
    pub lattice: LatticeConfig,
    pub couplings: CouplingConfig,
    pub sweep: SweepConfig,
    pub regimes: Vec<Regime>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: DEF_TOL,
            snapshots: vec![0, 1, 2, 5, 10, 15, 20],
            outdir: PathBuf::from("output/edgemotion"),
            lattice: LatticeConfig::default(),
            couplings: CouplingConfig::default(),
            sweep: SweepConfig::default(),
            regimes: vec![Regime::anomalous(), Regime::haldane()],
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> FloquetResult<Self> {
        let config: Self
            = toml::from_str(s)
            .map_err(|e| FloquetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load<P>(path: P) -> FloquetResult<Self>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| {
                FloquetError::Config(format!("{}: {}", path.display(), e))
            })?;
        Self::from_toml_str(&s)
    }

    /// Render as a TOML document that [`Self::from_toml_str`] reads back to
    /// an equal `Config`.
    pub fn to_toml_string(&self) -> FloquetResult<String> {
        toml::to_string(self).map_err(|e| FloquetError::Config(e.to_string()))
    }

    /// Check lattice sizes, positivity of all numeric parameters, regime
    /// labels, and that every snapshot falls within every regime's time grid.
    pub fn validate(&self) -> FloquetResult<()> {
        Lattice::new(self.lattice.n, self.lattice.ly)?;
        if self.sweep.num_ky == 0 {
            return Err(FloquetError::NonPositive {
                what: "number of sweep momenta", value: 0.0 });
        }
        positive("tolerance", self.tolerance)?;
        let CouplingConfig { j, j_prime } = self.couplings;
        if !j.is_finite() || !j_prime.is_finite() {
            return Err(FloquetError::Config(
                format!("couplings must be finite, got J = {j}, J' = {j_prime}")));
        }
        if self.regimes.is_empty() {
            return Err(FloquetError::Config("no driving regimes given".into()));
        }
        let mut labels: FxHashSet<&str> = FxHashSet::default();
        for regime in self.regimes.iter() {
            regime.validate()?;
            if !labels.insert(regime.label.as_str()) {
                return Err(FloquetError::Config(
                    format!("duplicate regime label '{}'", regime.label)));
            }
            if let Some(&index) = self.snapshots.iter().find(|&&k| k >= regime.periods) {
                return Err(FloquetError::OutOfRange {
                    what: "snapshot", index, len: regime.periods });
            }
        }
        Ok(())
    }

    pub fn lattice(&self) -> FloquetResult<Lattice> {
        Lattice::new(self.lattice.n, self.lattice.ly)
    }

    pub fn couplings(&self) -> Couplings { self.couplings.into() }

    /// Floquet operator builder for this configuration.
    pub fn builder(&self) -> FloquetResult<UBuilder> {
        Ok(UBuilder::new(self.lattice()?, self.couplings()))
    }

    /// Momentum grid for the quasienergy sweep.
    pub fn sweep_momenta(&self) -> nd::Array1<f64> {
        brillouin_zone(self.sweep.num_ky)
    }

    /// Edge-propagation simulator for one regime.
    pub fn simulator(&self, regime: &Regime) -> FloquetResult<EdgeSimulator> {
        EdgeSimulator::new(self.builder()?, regime.period(), regime.periods)?
            .with_tolerance(self.tolerance)
    }
}
