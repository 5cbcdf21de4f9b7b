use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant judgment as it is written to the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    #[serde(rename = "same")]
    Same,
    #[serde(rename = "diff")]
    Different,
    #[serde(rename = "NA")]
    NoResponse,
}

impl Response {
    pub fn label(&self) -> &'static str {
        match self {
            Response::Same => "same",
            Response::Different => "diff",
            Response::NoResponse => "NA",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome shown to the participant after each trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Correct,
    Incorrect,
    NoResponse,
}

impl Feedback {
    /// Picks the feedback for a finished trial.
    ///
    /// A response time of zero is the no-response sentinel and wins over the
    /// response label.
    pub fn evaluate(response: Response, expected: Response, response_time_s: f64) -> Self {
        if response_time_s == 0.0 || response == Response::NoResponse {
            Feedback::NoResponse
        } else if response == expected {
            Feedback::Correct
        } else {
            Feedback::Incorrect
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Feedback::Correct => "Correct",
            Feedback::Incorrect => "Incorrect",
            Feedback::NoResponse => "No response timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_response_is_correct() {
        assert_eq!(
            Feedback::evaluate(Response::Same, Response::Same, 3.2),
            Feedback::Correct
        );
        assert_eq!(
            Feedback::evaluate(Response::Different, Response::Different, 3.2),
            Feedback::Correct
        );
    }

    #[test]
    fn mismatching_response_is_incorrect() {
        assert_eq!(
            Feedback::evaluate(Response::Same, Response::Different, 1.0),
            Feedback::Incorrect
        );
    }

    #[test]
    fn zero_response_time_means_no_response() {
        assert_eq!(
            Feedback::evaluate(Response::NoResponse, Response::Same, 0.0),
            Feedback::NoResponse
        );
        // the sentinel wins even if a label slipped through
        assert_eq!(
            Feedback::evaluate(Response::Same, Response::Same, 0.0),
            Feedback::NoResponse
        );
    }

    #[test]
    fn labels_match_result_table_vocabulary() {
        assert_eq!(Response::Same.to_string(), "same");
        assert_eq!(Response::Different.to_string(), "diff");
        assert_eq!(Response::NoResponse.to_string(), "NA");
    }
}
