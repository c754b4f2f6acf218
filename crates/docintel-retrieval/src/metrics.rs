use serde::Serialize;
use std::fmt;

use docintel_core::types::{Chunk, RetrievalResult};

/// Letter grade for the average score of a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityGrade { A, B, C, D, F }

impl QualityGrade {
    pub fn from_avg_score(avg: f32) -> Self {
        match avg {
            s if s >= 0.85 => Self::A,
            s if s >= 0.75 => Self::B,
            s if s >= 0.65 => Self::C,
            s if s >= 0.5 => Self::D,
            _ => Self::F,
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self:?}") }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    /// >= 0.85
    pub excellent: usize,
    /// 0.7..0.85
    pub good: usize,
    /// 0.5..0.7
    pub fair: usize,
    pub poor: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalMetrics {
    pub num_results: usize,
    pub avg_score: f32,
    pub min_score: f32,
    pub max_score: f32,
    pub above_threshold: usize,
    pub quality_grade: QualityGrade,
    pub score_distribution: ScoreDistribution,
}

pub fn retrieval_metrics(results: &[RetrievalResult], min_score: f32) -> RetrievalMetrics {
    let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
    if scores.is_empty() {
        return RetrievalMetrics {
            num_results: 0,
            avg_score: 0.0,
            min_score: 0.0,
            max_score: 0.0,
            above_threshold: 0,
            quality_grade: QualityGrade::F,
            score_distribution: ScoreDistribution::default(),
        };
    }
    let avg = scores.iter().sum::<f32>() / scores.len() as f32;
    let mut distribution = ScoreDistribution::default();
    for &s in &scores {
        match s {
            s if s >= 0.85 => distribution.excellent += 1,
            s if s >= 0.7 => distribution.good += 1,
            s if s >= 0.5 => distribution.fair += 1,
            _ => distribution.poor += 1,
        }
    }
    RetrievalMetrics {
        num_results: scores.len(),
        avg_score: round3(avg),
        min_score: round3(scores.iter().copied().fold(f32::INFINITY, f32::min)),
        max_score: round3(scores.iter().copied().fold(f32::NEG_INFINITY, f32::max)),
        above_threshold: scores.iter().filter(|&&s| s >= min_score).count(),
        quality_grade: QualityGrade::from_avg_score(avg),
        score_distribution: distribution,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeDistribution {
    /// under 500 characters
    pub small: usize,
    pub medium: usize,
    /// 1000 characters and up
    pub large: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChunkStatistics {
    pub total_chunks: usize,
    pub avg_chunk_size: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    pub total_characters: usize,
    pub size_distribution: SizeDistribution,
}

/// Size statistics in characters.
pub fn chunk_statistics(chunks: &[Chunk]) -> ChunkStatistics {
    let sizes: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
    if sizes.is_empty() {
        return ChunkStatistics::default();
    }
    let total: usize = sizes.iter().sum();
    let mut distribution = SizeDistribution::default();
    for &s in &sizes {
        match s {
            0..=499 => distribution.small += 1,
            500..=999 => distribution.medium += 1,
            _ => distribution.large += 1,
        }
    }
    ChunkStatistics {
        total_chunks: sizes.len(),
        avg_chunk_size: (total as f64 / sizes.len() as f64).round() as usize,
        min_chunk_size: sizes.iter().copied().min().unwrap_or(0),
        max_chunk_size: sizes.iter().copied().max().unwrap_or(0),
        total_characters: total,
        size_distribution: distribution,
    }
}

fn round3(v: f32) -> f32 { (v * 1000.0).round() / 1000.0 }
