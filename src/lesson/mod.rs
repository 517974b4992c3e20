//! Lessons: the catalogue of levels and the per-line analysis the stepper
//! runs over the learner's source.
//!
//! ```text
//! source --> plan::ExecutionPlan::build --> [Step { line_number, code, kind }]
//!                   |                                   |
//!            classify::classify             calls::* (print args, input
//!                                            prompt, input substitution)
//! ```

pub mod buffer;
pub mod calls;
pub mod classify;
pub mod plan;

pub use buffer::SourceBuffer;
pub use classify::{classify, LineKind};
pub use plan::{ExecutionPlan, Step};

/// One editable starting program of a lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonTemplate {
    pub label: &'static str,
    pub source: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lesson {
    pub id: u8,
    pub title: &'static str,
    /// At least one; the learner can switch between them (level 5's text vs number mode)
    pub templates: &'static [LessonTemplate],
    /// Teacher bubble once validation succeeds
    pub validated_message: &'static str,
    /// Teacher bubble once the last step has run
    pub completion_message: &'static str,
}

impl Lesson {
    pub fn default_template(&self) -> &'static LessonTemplate {
        &self.templates[0]
    }

    /// Template after `current`, wrapping around
    pub fn next_template(&self, current: usize) -> usize {
        (current + 1) % self.templates.len()
    }
}

pub const LESSONS: &[Lesson] = &[
    Lesson {
        id: 1,
        title: "Hello World",
        templates: &[LessonTemplate {
            label: "print",
            source: "print(\"Hello World!\")",
        }],
        validated_message: "Python is reading your code! Click 'Next Step' to see it move!",
        completion_message: "Wow! You used the print command to send a message to the screen!",
    },
    Lesson {
        id: 2,
        title: "Variables",
        templates: &[LessonTemplate {
            label: "variables",
            source: "message = \"Keep Smiling\"\nprint(message)\nuserNo = 101\nprint(\"User Number is\", userNo)",
        }],
        validated_message: "✅ Code validated! Click 'Next Step' to see how Python executes it line by line.",
        completion_message: "🎉 Excellent! You've seen how Python stores and uses variables! Try changing the values and running again.",
    },
    Lesson {
        id: 3,
        title: "Rectangle Area",
        templates: &[LessonTemplate {
            label: "area",
            source: "length = 10\nbreadth = 20\narea = length * breadth\nprint(area)",
        }],
        validated_message: "✅ Code validated! Click 'Next Step' to see how Python calculates the rectangle area.",
        completion_message: "🎉 Excellent! You've learned how Python calculates area! Try changing values.",
    },
    Lesson {
        id: 4,
        title: "User Input",
        templates: &[LessonTemplate {
            label: "input",
            source: "name = input(\"Enter your name: \")\nprint(name)",
        }],
        validated_message: "✅ Code validated! Click 'Next Step' to see how Python handles user input.",
        completion_message: "🎉 Excellent! You've learned how Python gets input from users! Try changing the prompt message and run again.",
    },
    Lesson {
        id: 5,
        title: "3 + 4",
        templates: &[
            LessonTemplate {
                label: "text",
                source: "a = input()\nb = input()\nprint(a + b)",
            },
            LessonTemplate {
                label: "number",
                source: "a = int(input())\nb = int(input())\nprint(a + b)",
            },
        ],
        validated_message: "✅ Code validated! Click 'Next Step' to see how Python handles addition.",
        completion_message: "🎉 Excellent! You've learned string vs number addition! Try switching modes and run again.",
    },
];

pub fn by_id(id: u8) -> Option<&'static Lesson> {
    LESSONS.iter().find(|lesson| lesson.id == id)
}
