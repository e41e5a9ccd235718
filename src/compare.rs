use crate::round::Outcome;

const RATE_EPSILON: f64 = 1e-9;

/// Compares a complete response against the challenge in one step
pub fn whole_response<T: PartialEq>(expected: &[T], response: &[T]) -> Outcome {
    Outcome::from_bool(expected.len() == response.len() && expected == response)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Accepted,
    Rejected { attempts_left: u32 },
    Exhausted,
}

/// Validates each input element as it arrives. Wrong elements are not
/// accepted into the response; each one costs an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepGate {
    budget: u32,
    misses: u32,
}

impl StepGate {
    pub fn new(budget: u32) -> Self {
        Self {
            budget: budget.max(1),
            misses: 0,
        }
    }

    pub fn check<T: PartialEq>(&mut self, expected: &T, got: &T) -> StepResult {
        if expected == got {
            return StepResult::Accepted;
        }
        if self.is_exhausted() {
            return StepResult::Exhausted;
        }
        self.misses += 1;
        if self.is_exhausted() {
            StepResult::Exhausted
        } else {
            StepResult::Rejected {
                attempts_left: self.budget - self.misses,
            }
        }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn attempts_left(&self) -> u32 {
        self.budget.saturating_sub(self.misses)
    }

    pub fn is_exhausted(&self) -> bool {
        self.misses >= self.budget
    }
}

/// Success-rate rule for rounds made of several questions
#[derive(Debug, Clone, PartialEq)]
pub struct RateThreshold {
    required: f64,
    total: usize,
    answered: usize,
    correct: usize,
}

impl RateThreshold {
    pub fn new(total: usize, required: f64) -> Self {
        Self {
            required: required.clamp(0.0, 1.0),
            total: total.max(1),
            answered: 0,
            correct: 0,
        }
    }

    /// Records one answer. Returns the outcome once the last question is in.
    pub fn record(&mut self, correct: bool) -> Option<Outcome> {
        if self.answered >= self.total {
            return None;
        }
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        if self.answered == self.total {
            Some(Outcome::from_bool(self.passes(self.correct)))
        } else {
            None
        }
    }

    /// The outcome as soon as the remaining answers can no longer change it
    pub fn settled(&self) -> Option<Outcome> {
        let remaining = self.total - self.answered;
        if self.passes(self.correct) {
            Some(Outcome::Correct)
        } else if !self.passes(self.correct + remaining) {
            Some(Outcome::Wrong)
        } else {
            None
        }
    }

    pub fn rate(&self) -> f64 {
        self.correct as f64 / self.total as f64
    }

    pub fn required(&self) -> f64 {
        self.required
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    fn passes(&self, correct: usize) -> bool {
        correct as f64 / self.total as f64 + RATE_EPSILON >= self.required
    }
}
