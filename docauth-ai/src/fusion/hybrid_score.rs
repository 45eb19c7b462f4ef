//! Hybrid Score Fusion
//!
//! Combines the heuristic vision-side signals with the optional generative
//! signal into one 0-100 score and a recommendation. Pure and deterministic.
//!
//! # Scoring Algorithm
//! - **Vision weight**: 0.4 with a generative signal, 0.7 without
//! - **Text factor**: 30 (high clarity, > 50 words, > 200 chars),
//!   20 (medium clarity, > 20 words), 12 (> 10 words), else 5
//! - **Elements factor**: min(15, seals×5) + min(12, signatures×4)
//!   + min(10, logos×3), counting evidence entries of present flags
//! - **Quality factor**: formal 15, informal 8, doubtful 3
//! - **Generative factor** (0-60): authenticity×0.4 + adjustment
//!   + consistency×0.2 − 5 per suspicious element, weighted 0.6
//! - **Hybrid bonus**: +5 per agreeing signature/seal flag, +8 when the
//!   reported document type appears in the text
//!
//! # Recommendation
//! With generative signal: accept ≥ 80 and nothing suspicious, review ≥ 60.
//! Without: accept ≥ 75, review ≥ 45. Everything else is reject.

use crate::types::{
    word_count, DocumentStructure, DocumentType, FusedResult, GenerativeSignal, QualityAssessment,
    QualityLevel, Recommendation, ScoreBreakdown, SecurityElementSet,
};
use tracing::debug;

pub const VISION_WEIGHT_HYBRID: f64 = 0.4;
pub const VISION_WEIGHT_ALONE: f64 = 0.7;
pub const GENERATIVE_WEIGHT: f64 = 0.6;
pub const GENERATIVE_FACTOR_MAX: f64 = 60.0;

pub const ACCEPT_THRESHOLD_HYBRID: f64 = 80.0;
pub const REVIEW_THRESHOLD_HYBRID: f64 = 60.0;
pub const ACCEPT_THRESHOLD_ALONE: f64 = 75.0;
pub const REVIEW_THRESHOLD_ALONE: f64 = 45.0;

/// Fuse all signals into the final score
pub fn fuse(
    quality: &QualityAssessment,
    elements: &SecurityElementSet,
    text: &str,
    generative: Option<&GenerativeSignal>,
) -> FusedResult {
    let words = word_count(text);
    let chars = text.chars().count();
    let lower = text.to_lowercase();

    let vision_weight = if generative.is_some() {
        VISION_WEIGHT_HYBRID
    } else {
        VISION_WEIGHT_ALONE
    };

    let text_factor = text_factor(quality.text_clarity, words, chars);
    let elements_factor = elements_factor(elements);
    let quality_factor = quality_factor(quality.structure);

    let (generative_factor, hybrid_bonus) = match generative {
        Some(signal) => (
            generative_factor(signal),
            hybrid_bonus(elements, signal, &lower),
        ),
        None => (0.0, 0.0),
    };

    let vision_score = (text_factor + elements_factor + quality_factor) * vision_weight;
    let generative_portion = if generative.is_some() {
        generative_factor * GENERATIVE_WEIGHT
    } else {
        0.0
    };
    let score = (vision_score + generative_portion + hybrid_bonus).clamp(0.0, 100.0);

    let suspicious_count = generative.map_or(0, |s| s.suspicious_elements.len());
    let recommendation = recommend(score, generative.is_some(), suspicious_count);

    debug!(
        score,
        recommendation = %recommendation,
        text_factor,
        elements_factor,
        quality_factor,
        generative_factor,
        hybrid_bonus,
        vision_weight,
        "Score fusion complete"
    );

    FusedResult {
        score,
        recommendation,
        elements: elements.clone(),
        breakdown: ScoreBreakdown {
            vision_weight,
            text_factor,
            elements_factor,
            quality_factor,
            generative_factor,
            hybrid_bonus,
            vision_score,
            generative_portion,
            word_count: words,
            char_count: chars,
            generative_present: generative.is_some(),
            suspicious_count,
        },
    }
}

/// Recommendation from score and signal context (lower bounds inclusive)
pub fn recommend(score: f64, generative_present: bool, suspicious_count: usize) -> Recommendation {
    if generative_present {
        if score >= ACCEPT_THRESHOLD_HYBRID && suspicious_count == 0 {
            Recommendation::Accept
        } else if score >= REVIEW_THRESHOLD_HYBRID {
            Recommendation::Review
        } else {
            Recommendation::Reject
        }
    } else if score >= ACCEPT_THRESHOLD_ALONE {
        Recommendation::Accept
    } else if score >= REVIEW_THRESHOLD_ALONE {
        Recommendation::Review
    } else {
        Recommendation::Reject
    }
}

fn text_factor(clarity: QualityLevel, words: usize, chars: usize) -> f64 {
    if clarity == QualityLevel::High && words > 50 && chars > 200 {
        30.0
    } else if clarity == QualityLevel::Medium && words > 20 {
        20.0
    } else if words > 10 {
        12.0
    } else {
        5.0
    }
}

fn elements_factor(elements: &SecurityElementSet) -> f64 {
    let mut factor = 0.0;
    if elements.seals {
        factor += (elements.seal_details.len() as f64 * 5.0).min(15.0);
    }
    if elements.signatures {
        factor += (elements.signature_details.len() as f64 * 4.0).min(12.0);
    }
    if elements.logos {
        factor += (elements.logo_details.len() as f64 * 3.0).min(10.0);
    }
    factor
}

fn quality_factor(structure: DocumentStructure) -> f64 {
    match structure {
        DocumentStructure::Formal => 15.0,
        DocumentStructure::Informal => 8.0,
        DocumentStructure::Doubtful => 3.0,
    }
}

fn generative_factor(signal: &GenerativeSignal) -> f64 {
    let mut adjustment = 0.0;
    if signal.has_signatures && signal.signature_count > 0 {
        adjustment += f64::from(signal.signature_count) * 8.0;
    }
    if signal.has_seals && signal.seal_count > 0 {
        adjustment += f64::from(signal.seal_count) * 10.0;
    }
    if signal.has_watermarks {
        adjustment += 12.0;
    }

    let penalty = signal.suspicious_elements.len() as f64 * 5.0;
    let consistency = signal.format_consistency * 0.2;

    (signal.authenticity_score * 0.4 + adjustment + consistency - penalty)
        .clamp(0.0, GENERATIVE_FACTOR_MAX)
}

fn hybrid_bonus(elements: &SecurityElementSet, signal: &GenerativeSignal, lower_text: &str) -> f64 {
    let mut bonus = 0.0;
    if elements.signatures && signal.has_signatures {
        bonus += 5.0;
    }
    if elements.seals && signal.has_seals {
        bonus += 5.0;
    }
    match signal.document_type {
        DocumentType::Certificate if lower_text.contains("certificado") => bonus += 8.0,
        DocumentType::Diploma if lower_text.contains("diploma") => bonus += 8.0,
        _ => {}
    }
    bonus
}
