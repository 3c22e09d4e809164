//! Preset questions wired to the "Quick Questions" buttons.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresetQuestion {
    /// Button text.
    pub label: &'static str,
    /// Sent to the agent. Not always equal to the label.
    pub question: &'static str,
}

pub const PRESETS: [PresetQuestion; 3] = [
    PresetQuestion {
        label: "How many individual purchased sedan?",
        question: "How many individual purchased sedan?",
    },
    PresetQuestion {
        label: "What is the price of sedan in Gurgaon?",
        question: "What is the price of sedan in Gurgaon?",
    },
    PresetQuestion {
        label: "Total price of cars purchased by corporates?",
        question: "what is the total price value of cars purchased by corporates?",
    },
];

pub fn preset(index: usize) -> Option<&'static PresetQuestion> {
    PRESETS.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_button_sends_reworded_question() {
        let p = preset(2).unwrap();
        assert_ne!(p.label, p.question);
        assert_eq!(p.question, "what is the total price value of cars purchased by corporates?");
    }

    #[test]
    fn out_of_range_is_none() {
        assert!(preset(3).is_none());
    }
}
