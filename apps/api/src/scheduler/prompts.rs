// All LLM prompt constants for the schedulers.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Role for question generation. Replace `{question_count}` before sending.
pub const QUESTION_SYSTEM_ROLE: &str = "你是一名专业的招聘面试官，请根据岗位要求和候选人简历\
    生成{question_count}个针对性的技术面试问题，每个问题附带评分标准。";

/// Question generation prompt template.
/// Replace: {position_name}, {requirements}, {responsibilities}, {resume_text}, {question_count}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"岗位名称: {position_name}
岗位要求: {requirements}
岗位职责: {responsibilities}
候选人简历: {resume_text}

请生成{question_count}个面试问题和评分标准，每个问题满分100分。
返回如下结构的JSON对象（只包含 questions 字段）：
{
  "questions": [
    {"question": "请介绍一下你的专业背景和技能", "score_standard": "清晰度30分，相关性40分，深度30分"},
    {"question": "你认为自己最适合这个岗位的原因是什么？", "score_standard": "匹配度40分，自我认知30分，表达30分"},
    {"question": "描述一个你解决过的技术挑战", "score_standard": "复杂度30分，解决方案40分，结果30分"}
  ]
}"#;

/// Role for interview evaluation.
pub const EVALUATION_SYSTEM_ROLE: &str = "你是一位专业的面试评估专家，负责评估技术面试表现。";

/// Evaluation prompt header.
/// Replace: {candidate_name}, {position_name}, {interviewer}
pub const EVALUATION_PROMPT_HEADER: &str = r#"你需要对候选人"{candidate_name}"应聘"{position_name}"职位的面试表现进行评估。
面试官是{interviewer}。

请根据以下面试问题、评分标准和候选人的回答，对每个问题进行评分和点评，并给出综合评价。
注意每个问题评分范围是0-100分，综合评分范围是0-100分。
"#;

/// One block per question.
/// Replace: {index}, {question}, {score_standard}, {answer}
pub const EVALUATION_QUESTION_BLOCK: &str = r#"
问题{index}: {question}
评分标准: {score_standard}
候选人回答: {answer}
"#;

/// Requested output schema, appended after the question blocks.
pub const EVALUATION_PROMPT_FOOTER: &str = r#"
请以JSON格式返回评估结果，包含以下内容：
1. 每个问题的评分和评价
2. 技术能力总分(满分100)
3. 沟通能力总分(满分100)
4. 综合评分(满分100)
5. 面试官评语(综合评价候选人的优缺点)
6. 录用建议(推荐录用/可以考虑/不建议录用)

JSON格式示例:
{
  "question_evaluations": [
    {"id": 1, "question": "[question]", "score_standard": "[score_standard]", "answer": "[answer_text]", "score": 70, "comments": "回答详细，展示了扎实的基础知识..."},
    {"id": 2, "question": "[question]", "score_standard": "[score_standard]", "answer": "[answer_text]", "score": 90, "comments": "思路清晰，解决方案合理..."}
  ],
  "technical_score": 88,
  "communication_score": 90,
  "overall_score": 89,
  "comments": "候选人技术基础扎实，沟通能力强...",
  "recommendation": "推荐录用"
}"#;

pub const MISSING_FIELD_TEXT: &str = "未提供";
pub const MISSING_ANSWER_TEXT: &str = "未提供回答";
