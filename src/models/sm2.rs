//! SM-2 spaced repetition algorithm with learning steps.
//!
//! Cards pass through short sub-day learning steps before graduating into
//! day-scale review intervals:
//! - Learning/relearning: Again resets to the first step, Hard repeats the
//!   current step at half duration, Good/Easy advance and graduate past the
//!   last step (Easy graduates straight to 4 days)
//! - Review: intervals grow 1 day -> 6 days -> interval * ease factor, with
//!   a further 1.3x bonus on Easy
//! - A failed review (lapse) halves the interval and re-enters learning
//! - The ease factor adjusts per review and has a minimum value of 1.3

use super::review_data::MIN_EASE_FACTOR;
use super::{Quality, ReviewData, ReviewLogEntry, Settings};
use chrono::{DateTime, Duration, Utc};

/// Calculates new review data according to the SM-2 variant with learning
/// steps. Pure and deterministic: `now` is supplied by the caller and no
/// ambient state is read.
pub fn calculate_next_review(
    review_data: &ReviewData,
    quality: Quality,
    settings: &Settings,
    now: DateTime<Utc>,
) -> ReviewData {
    let steps = &settings.learning_steps;
    let was_learning = review_data.is_learning;

    let mut interval = review_data.interval;
    let mut repetitions = review_data.repetitions;
    let mut step = review_data.step;
    let mut is_learning = review_data.is_learning;
    let next_review;

    if was_learning {
        match quality {
            Quality::Again => {
                // Back to the first learning step
                step = 0;
                interval = 0;
                next_review = now + Duration::minutes(step_minutes(steps, 0));
            }
            Quality::Hard => {
                // Repeat the current step, but sooner
                interval = 0;
                let minutes = (step_minutes(steps, step) as f64 * 0.5).max(1.0);
                next_review = now + Duration::seconds((minutes * 60.0).round() as i64);
            }
            Quality::Good | Quality::Easy => {
                step += 1;
                if step >= steps.len() {
                    // Graduate into the review queue
                    is_learning = false;
                    repetitions = 1;
                    interval = if quality == Quality::Easy { 4 } else { 1 };
                    let scheduled =
                        (interval as f64 * settings.interval_multiplier).round() as i64;
                    next_review = now + Duration::days(scheduled);
                } else {
                    interval = 0;
                    next_review = now + Duration::minutes(step_minutes(steps, step));
                }
            }
        }
    } else if quality.is_correct() {
        interval = match repetitions {
            0 => 1,
            1 => 6,
            _ => {
                (review_data.interval as f64
                    * review_data.ease_factor
                    * settings.interval_multiplier)
                    .round() as i64
            }
        };
        repetitions += 1;
        if quality == Quality::Easy {
            // Easy bonus, compounding on top of the ease factor step
            interval = (interval as f64 * 1.3).round() as i64;
        }
        next_review = now + Duration::days(interval);
    } else {
        // Lapse: back into relearning with a halved interval. The interval
        // is stored but not used again until the card re-graduates.
        is_learning = true;
        step = 0;
        repetitions = 0;
        interval = ((review_data.interval as f64 * 0.5).round() as i64).max(1);
        next_review = now + Duration::minutes(step_minutes(steps, 0));
    }

    // Only cards that entered this review graduated move their ease factor;
    // learning-phase cards never touch it.
    let mut ease_factor = review_data.ease_factor;
    if !was_learning {
        let q = quality.code() as f64;
        ease_factor += 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
        ease_factor = ease_factor.max(MIN_EASE_FACTOR);
    }

    let mut review_history = review_data.review_history.clone();
    review_history.push(ReviewLogEntry {
        timestamp: now,
        quality,
        interval,
        is_learning,
    });

    ReviewData {
        interval,
        ease_factor,
        repetitions,
        step,
        is_learning,
        next_review: Some(next_review),
        last_review: Some(now),
        review_history,
        memory_state: review_data.memory_state.clone(),
    }
}

fn step_minutes(steps: &[u32], index: usize) -> i64 {
    steps.get(index).copied().unwrap_or(1) as i64
}
