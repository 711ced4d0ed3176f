//! Prompt assembly for generation slots
//!
//! Builds the per-strategy prompt from the stage task, the request
//! context, and retrieved worked examples. Regeneration attempts perturb
//! the prompt with a rotating angle directive while the strategy tag
//! stays fixed.

use riff_core::Stage;

/// Angle directives cycled through on regeneration attempts.
const PERTURBATION_ANGLES: [&str; 4] = [
    "Take a noticeably different angle from the obvious one.",
    "Lead with a concrete detail or number.",
    "Write it for a skeptical reader who has seen every pitch.",
    "Strip it down: half the length, twice the punch.",
];

/// One retrieved past success injected as a worked example.
#[derive(Debug, Clone)]
pub struct WorkedExample {
    pub candidate_id: riff_core::CandidateId,
    pub content: String,
}

/// Assembles generation prompts.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build the prompt for one slot.
    ///
    /// `attempt` 0 is the initial generation; higher values are
    /// regenerations and rotate through the perturbation angles.
    pub fn build(
        &self,
        stage: Stage,
        strategy: &str,
        context_text: &str,
        examples: &[WorkedExample],
        attempt: u32,
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str(stage_task(stage));
        prompt.push_str("\n\n");
        prompt.push_str(&format!(
            "Approach: {} - {}\n",
            strategy,
            strategy_directive(strategy)
        ));

        if !context_text.is_empty() {
            prompt.push_str("\nContext:\n");
            prompt.push_str(context_text);
            prompt.push('\n');
        }

        if !examples.is_empty() {
            prompt.push_str("\nExamples that performed well previously:\n");
            for (i, example) in examples.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, example.content));
            }
        }

        if attempt > 0 {
            let angle = PERTURBATION_ANGLES[(attempt as usize - 1) % PERTURBATION_ANGLES.len()];
            prompt.push_str(&format!(
                "\nYour previous attempt was too similar to another variant. {angle}\n"
            ));
        }

        prompt
    }
}

fn stage_task(stage: Stage) -> &'static str {
    match stage {
        Stage::Research => {
            "Research the topic below. Surface the strongest facts, sources, and angles."
        }
        Stage::Outline => "Draft an outline for the piece described below.",
        Stage::Copy => "Write the body copy for the piece described below.",
        Stage::Hook => "Write one opening hook for the piece described below.",
        Stage::Visual => "Describe one visual concept for the piece described below.",
    }
}

fn strategy_directive(strategy: &str) -> &'static str {
    match strategy {
        "comprehensive" => "cover the topic broadly, every major angle in scope",
        "focused" => "go deep on the single strongest angle",
        "visual-first" => "prioritize facts and angles that translate to imagery",
        "classic" => "a conventional, proven structure",
        "narrative" => "structure it as a story with an arc",
        "listicle" => "structure it as a numbered list of points",
        "short-punchy" => "short sentences, high energy, no filler",
        "detailed" => "thorough and specific, every claim backed",
        "story-driven" => "anchor everything in one concrete story",
        "question" => "open with a question the reader must answer",
        "bold-claim" => "open with a claim that demands attention",
        "pattern-interrupt" => "open with something unexpected for the format",
        "minimal" => "one focal element, generous negative space",
        "data-rich" => "charts, numbers, and comparisons front and center",
        "illustrative" => "scene-setting imagery over abstraction",
        _ => "use your judgment for this approach",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riff_core::CandidateId;

    fn example(content: &str) -> WorkedExample {
        WorkedExample {
            candidate_id: CandidateId::new(),
            content: content.to_string(),
        }
    }

    #[test]
    fn prompt_contains_stage_task_and_strategy() {
        let prompt = PromptAssembler::new().build(Stage::Hook, "question", "launch post", &[], 0);
        assert!(prompt.contains("opening hook"));
        assert!(prompt.contains("question"));
        assert!(prompt.contains("launch post"));
    }

    #[test]
    fn every_rotation_strategy_has_a_directive() {
        for stage in Stage::ALL {
            for strategy in stage.strategy_rotation() {
                assert_ne!(
                    strategy_directive(strategy),
                    "use your judgment for this approach",
                    "missing directive for {strategy}"
                );
            }
        }
    }

    #[test]
    fn examples_are_numbered_into_the_prompt() {
        let examples = vec![example("First winner"), example("Second winner")];
        let prompt = PromptAssembler::new().build(Stage::Copy, "detailed", "ctx", &examples, 0);
        assert!(prompt.contains("1. First winner"));
        assert!(prompt.contains("2. Second winner"));
        assert!(prompt.contains("performed well previously"));
    }

    #[test]
    fn no_examples_section_when_retrieval_came_back_empty() {
        let prompt = PromptAssembler::new().build(Stage::Copy, "detailed", "ctx", &[], 0);
        assert!(!prompt.contains("performed well previously"));
    }

    #[test]
    fn regeneration_perturbs_but_first_attempt_does_not() {
        let assembler = PromptAssembler::new();
        let first = assembler.build(Stage::Copy, "detailed", "ctx", &[], 0);
        assert!(!first.contains("too similar"));

        let retry = assembler.build(Stage::Copy, "detailed", "ctx", &[], 1);
        assert!(retry.contains("too similar"));
        assert!(retry.contains(PERTURBATION_ANGLES[0]));
    }

    #[test]
    fn successive_attempts_rotate_angles() {
        let assembler = PromptAssembler::new();
        let a = assembler.build(Stage::Copy, "detailed", "ctx", &[], 1);
        let b = assembler.build(Stage::Copy, "detailed", "ctx", &[], 2);
        assert_ne!(a, b);
        assert!(b.contains(PERTURBATION_ANGLES[1]));
    }

    #[test]
    fn prompt_is_deterministic_per_attempt() {
        let assembler = PromptAssembler::new();
        let a = assembler.build(Stage::Research, "focused", "ctx", &[], 2);
        let b = assembler.build(Stage::Research, "focused", "ctx", &[], 2);
        assert_eq!(a, b);
    }
}
