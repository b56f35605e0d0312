// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to every system prompt; the API is called in JSON-object mode.
pub const JSON_ONLY_INSTRUCTION: &str = "你必须只返回一个合法的JSON对象。\
    不要在JSON之外输出任何文字，不要使用markdown代码块，不要解释或道歉。";

/// Joins a role description with the JSON-only instruction.
pub fn json_system(role: &str) -> String {
    format!("{role}\n{JSON_ONLY_INSTRUCTION}")
}
