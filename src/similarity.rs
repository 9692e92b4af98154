//! Weighted contextual distance between two enriched records.
//!
//! This is a ranking heuristic, not a metric. Each modeled dimension adds its
//! weight when the two records disagree on it, and the time dimension adds
//! `weight * log10(|Δt|)`. Terms that come out non-finite are dropped.

use crate::record::EnrichedRecord;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One weight per scored dimension.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DistParams {
    pub exit_code: f64,
    pub machine_id: f64,
    pub session_id: f64,
    pub login: f64,
    pub shell: f64,
    pub pwd: f64,
    pub real_pwd: f64,
    pub git_dir: f64,
    pub git_real_dir: f64,
    pub git_origin_remote: f64,
    pub time: f64,
}

impl Default for DistParams {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl DistParams {
    pub fn uniform(weight: f64) -> Self {
        Self {
            exit_code: weight,
            machine_id: weight,
            session_id: weight,
            login: weight,
            shell: weight,
            pwd: weight,
            real_pwd: weight,
            git_dir: weight,
            git_real_dir: weight,
            git_origin_remote: weight,
            time: weight,
        }
    }

    /// All weights zero.
    pub fn zero() -> Self {
        Self::uniform(0.0)
    }

    pub fn weights(&self) -> [(Dimension, f64); 11] {
        [
            (Dimension::ExitCode, self.exit_code),
            (Dimension::MachineId, self.machine_id),
            (Dimension::SessionId, self.session_id),
            (Dimension::Login, self.login),
            (Dimension::Shell, self.shell),
            (Dimension::Pwd, self.pwd),
            (Dimension::RealPwd, self.real_pwd),
            (Dimension::GitDir, self.git_dir),
            (Dimension::GitRealDir, self.git_real_dir),
            (Dimension::GitOriginRemote, self.git_origin_remote),
            (Dimension::Time, self.time),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ExitCode,
    MachineId,
    SessionId,
    Login,
    Shell,
    Pwd,
    RealPwd,
    GitDir,
    GitRealDir,
    GitOriginRemote,
    Time,
}

fn mismatch(a: &str, b: &str) -> f64 {
    if a != b {
        1.0
    } else {
        0.0
    }
}

impl EnrichedRecord {
    /// Weighted contribution of every dimension that adds something to the
    /// distance, in dimension order.
    pub fn distance_breakdown(
        &self,
        other: &EnrichedRecord,
        p: &DistParams,
    ) -> Vec<(Dimension, f64)> {
        let (a, b) = (self.base(), other.base());

        let exit = match (a.exit_code, b.exit_code) {
            (x, y) if x == y => 0.0,
            (0, _) | (_, 0) => 1.0,
            _ => 0.5,
        };
        let time = (a.realtime_before - b.realtime_before).abs().log10();

        let factors = [
            exit,
            mismatch(&a.machine_id, &b.machine_id),
            mismatch(&a.session_id, &b.session_id),
            mismatch(&a.login, &b.login),
            mismatch(&a.shell, &b.shell),
            mismatch(&a.pwd, &b.pwd),
            mismatch(&a.real_pwd, &b.real_pwd),
            mismatch(&a.git_dir, &b.git_dir),
            mismatch(&a.git_real_dir, &b.git_real_dir),
            mismatch(&a.git_origin_remote, &b.git_origin_remote),
            time,
        ];

        p.weights()
            .into_iter()
            .zip(factors)
            .map(|((dim, weight), factor)| (dim, factor * weight))
            .filter(|(_, term)| term.is_finite() && *term != 0.0)
            .collect()
    }

    /// Sum of [`EnrichedRecord::distance_breakdown`]. Zero means no modeled
    /// dimension differs.
    pub fn distance_to(&self, other: &EnrichedRecord, p: &DistParams) -> f64 {
        self.distance_breakdown(other, p)
            .into_iter()
            .map(|(_, term)| term)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct Ranked<'a> {
    pub record: &'a EnrichedRecord,
    pub distance: f64,
}

/// Order candidates by distance to `query`, closest first. Ties keep input
/// order.
pub fn rank<'a>(
    query: &EnrichedRecord,
    candidates: &'a [EnrichedRecord],
    p: &DistParams,
) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<Ranked<'a>> = candidates
        .iter()
        .map(|record| Ranked {
            record,
            distance: query.distance_to(record, p),
        })
        .collect();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}

/// Same ordering as [`rank`], scoring candidates on the rayon pool.
pub fn rank_parallel<'a>(
    query: &EnrichedRecord,
    candidates: &'a [EnrichedRecord],
    p: &DistParams,
) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<Ranked<'a>> = candidates
        .par_iter()
        .map(|record| Ranked {
            record,
            distance: query.distance_to(record, p),
        })
        .collect();
    ranked.par_sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}
