//! Fixed HTML template for interview reports.

use std::fmt::Write;

use super::{Evaluation, ReportContext};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 40px; }
.container { max-width: 800px; margin: auto; }
.header { text-align: center; border-bottom: 2px solid #333; padding-bottom: 20px; }
.section { margin-top: 20px; }
.section h2 { color: #2c3e50; }
.table { width: 100%; border-collapse: collapse; margin-top: 10px; }
.table th, .table td { border: 1px solid #ddd; padding: 8px; text-align: left; }
.table th { background-color: #f2f2f2; }
.question-section { border: 1px solid #ddd; padding: 15px; margin-bottom: 15px; border-radius: 5px; }
.question-title { font-weight: bold; color: #2c3e50; }
.score { font-weight: bold; color: #e74c3c; }
.warning { background: #fff3cd; border: 1px solid #ffe69c; padding: 12px; margin-top: 20px; }
.footer { margin-top: 30px; text-align: center; color: #7f8c8d; }";

/// Renders the report document. `warning` is shown as a banner when the
/// evaluation is placeholder data.
pub fn render_report_html(
    context: &ReportContext,
    evaluation: &Evaluation,
    warning: Option<&str>,
) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str("<title>面试报告</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n<div class=\"container\">\n");

    let _ = write!(
        html,
        "<div class=\"header\"><h1>面试报告</h1><p>{}</p></div>\n",
        escape_html(&context.interview_date)
    );

    if let Some(reason) = warning {
        let _ = write!(
            html,
            "<div class=\"warning\"><strong>评估未完成：</strong>自动评估服务未返回有效结果，\
             以下评分为空，请人工复核。（{}）</div>\n",
            escape_html(reason)
        );
    }

    html.push_str("<div class=\"section\"><h2>候选人信息</h2><table class=\"table\">\n");
    push_row(&mut html, "姓名", &context.candidate_name);
    push_row(&mut html, "应聘职位", &context.position_name);
    push_row(&mut html, "面试官", &context.interviewer);
    html.push_str("</table></div>\n");

    html.push_str("<div class=\"section\"><h2>面试评估</h2><table class=\"table\">\n");
    push_row(&mut html, "技术能力", &format_score(evaluation.technical_score));
    push_row(&mut html, "沟通能力", &format_score(evaluation.communication_score));
    push_row(&mut html, "综合评分", &format_score(evaluation.overall_score));
    html.push_str("</table></div>\n");

    let _ = write!(
        html,
        "<div class=\"section\"><h2>面试官评语</h2><p>{}</p></div>\n",
        escape_html(&evaluation.comments)
    );
    let _ = write!(
        html,
        "<div class=\"section\"><h2>推荐意见</h2><p>{}</p></div>\n",
        escape_html(&evaluation.recommendation)
    );

    html.push_str("<div class=\"section\"><h2>问题评估详情</h2>\n");
    for (index, question) in evaluation.question_evaluations.iter().enumerate() {
        let number = question.id.unwrap_or(index as u32 + 1);
        let _ = write!(
            html,
            "<div class=\"question-section\">\
             <p class=\"question-title\">问题{}: {}</p>\
             <p><strong>评分标准:</strong> {}</p>\
             <p><strong>候选人回答:</strong> {}</p>\
             <p><strong>评分:</strong> <span class=\"score\">{}</span></p>\
             <p><strong>点评:</strong> {}</p>\
             </div>\n",
            number,
            escape_html(&question.question),
            escape_html(&question.score_standard),
            escape_html(&question.answer),
            format_score(question.score),
            escape_html(&question.comments),
        );
    }
    html.push_str("</div>\n");

    html.push_str("<div class=\"footer\"><p>Generated by Interview System</p></div>\n");
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn push_row(html: &mut String, label: &str, value: &str) {
    let _ = write!(
        html,
        "<tr><th>{}</th><td>{}</td></tr>\n",
        label,
        escape_html(value)
    );
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) if s.fract() == 0.0 => format!("{s:.0}/100"),
        Some(s) => format!("{s:.1}/100"),
        None => "—".to_string(),
    }
}

/// Minimal HTML escaping for text nodes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
