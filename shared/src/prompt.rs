//! Prompt construction.

/// Fixed tutor instructions placed ahead of every problem.
pub const SYSTEM_PROMPT: &str = "You are an experienced JEE/NSEP Physics teacher and tutor.
Answer clearly and rigorously for a student preparing competitive exams.
- Provide assumptions, list relevant formulae, show step-by-step derivation.
- Use LaTeX for all equations. Use $$...$$ for display equations and $...$ for inline math.
- At the end provide exactly one line with the final answer in \\boxed{...}.";

/// Build the single prompt sent upstream.
///
/// The question is embedded verbatim; it is not escaped or filtered.
pub fn build_prompt(question: &str, topic: &str) -> String {
    format!(
        "{}\n\nTopic: {}\nProblem:\n{}\n\nSolve step by step, showing the full derivation.\n\nSolution:",
        SYSTEM_PROMPT, topic, question
    )
}
