pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::{admin, handlers};
use crate::state::AppState;

/// Room for multipart framing and the question_id field on top of the audio itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let answer_body_limit = state.config.max_audio_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate session (token-gated)
        .route(
            "/api/v1/interview/:token/info",
            get(handlers::handle_get_info),
        )
        .route(
            "/api/v1/interview/:token/get_question",
            get(handlers::handle_get_question),
        )
        .route(
            "/api/v1/interview/:token/submit_answer",
            post(handlers::handle_submit_answer)
                .layer(DefaultBodyLimit::max(answer_body_limit)),
        )
        .route(
            "/api/v1/interview/:token/toggle_voice_reading",
            post(handlers::handle_toggle_voice_reading),
        )
        // Staff
        .route(
            "/api/v1/interviews",
            get(admin::handle_list_interviews).post(admin::handle_create_interview),
        )
        .route(
            "/api/v1/interviews/:id",
            axum::routing::put(admin::handle_update_interview)
                .delete(admin::handle_delete_interview),
        )
        .route(
            "/api/v1/interviews/:id/token",
            post(admin::handle_reissue_token),
        )
        .route(
            "/api/v1/interviews/:id/report",
            get(admin::handle_download_report),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::interview::status::InterviewStatus;
    use crate::models::interview::StoredReport;
    use crate::store::memory::MemoryStore;
    use crate::store::InterviewStore;
    use crate::transcription::testing::EchoTranscriber;

    const TOKEN: &str = "ABCDEFGHJKLMNPQRSTUVWXYZabcdefgh";
    const BOUNDARY: &str = "interview-test-boundary";

    fn app(store: Arc<MemoryStore>) -> Router {
        build_router(AppState {
            store,
            transcriber: Arc::new(EchoTranscriber::new()),
            config: Config::for_tests(),
        })
    }

    /// A QuestionsReady interview with two questions.
    fn seeded_store() -> (Arc<MemoryStore>, i64, Vec<i64>) {
        let store = Arc::new(MemoryStore::new());
        let position = store.insert_position("Rust 工程师", "精通 Rust", "负责后端服务");
        let candidate = store.insert_candidate(position, "张三", None);
        let interview = store.insert_interview(candidate, TOKEN, InterviewStatus::NotStarted);
        let questions = store.insert_questions(interview, &["Q1", "Q2"]);
        (store, interview, questions)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn answer_form(question_id: i64, audio: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"question_id\"\r\n\r\n{question_id}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio_answer\"; filename=\"answer.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(audio);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(format!("/api/v1/interview/{TOKEN}/submit_answer"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_query_returns_error_payload() {
        let (store, _, _) = seeded_store();

        let (status, body) = send(
            app(store),
            get(&format!("/api/v1/interview/{TOKEN}/get_question?current_id=abc")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_toggle_without_flag_disables_voice_reading() {
        let (store, interview, _) = seeded_store();
        let uri = format!("/api/v1/interview/{TOKEN}/toggle_voice_reading");

        send(app(store.clone()), post_json(&uri, json!({"enabled": true}))).await;
        let (status, body) = send(app(store.clone()), post_json(&uri, json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["voice_reading"], false);
        assert!(!store.interview(interview).unwrap().voice_reading);
    }

    #[tokio::test]
    async fn test_unparseable_json_body_returns_error_payload() {
        let (store, _, _) = seeded_store();

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/interview/{TOKEN}/toggle_voice_reading"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(store), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_non_numeric_interview_id_returns_error_payload() {
        let (store, _, _) = seeded_store();

        let (status, body) = send(app(store), get("/api/v1/interviews/abc/report")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_submit_to_unknown_token_without_audio_is_not_found() {
        let (store, interview, questions) = seeded_store();
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"question_id\"\r\n\r\n{}\r\n--{BOUNDARY}--\r\n",
            questions[0]
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/interview/unknown/submit_answer")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(app(store.clone()), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["error"]["code"], "NOT_FOUND");
        assert!(store.questions(interview)[0].answered_at.is_none());
    }

    #[tokio::test]
    async fn test_submit_without_multipart_body_returns_error_payload() {
        let (store, _, _) = seeded_store();

        let (status, body) = send(
            app(store),
            post_json(
                &format!("/api/v1/interview/{TOKEN}/submit_answer"),
                json!({"question_id": 1}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_health() {
        let (store, _, _) = seeded_store();
        let (status, body) = send(app(store), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_token_returns_error_payload() {
        let (store, interview, _) = seeded_store();

        let (status, body) = send(app(store.clone()), get("/api/v1/interview/missing/info")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["error"]["code"], "NOT_FOUND");
        assert_eq!(
            store.interview(interview).unwrap().status,
            InterviewStatus::QuestionsReady
        );
    }

    #[tokio::test]
    async fn test_info_and_question_flow_over_http() {
        let (store, _, questions) = seeded_store();

        let (status, body) = send(app(store.clone()), get(&format!("/api/v1/interview/{TOKEN}/info"))).await;
        assert_eq!(status, StatusCode::OK);
        let info = json_body(&body);
        assert_eq!(info["candidate"], "张三");
        assert_eq!(info["time"], "未设置时间");
        assert_eq!(info["status"], 1);

        let (status, body) = send(
            app(store.clone()),
            get(&format!("/api/v1/interview/{TOKEN}/get_question?current_id=0")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"id": questions[0], "text": "Q1"}));
    }

    #[tokio::test]
    async fn test_submit_answer_multipart() {
        let (store, interview, questions) = seeded_store();

        let (status, body) = send(app(store.clone()), answer_form(questions[0], b"voice")).await;

        assert_eq!(status, StatusCode::OK);
        let response = json_body(&body);
        assert_eq!(response["status"], "success");
        assert_eq!(response["message"], "答案已提交");
        assert_eq!(response["next_question"]["id"], questions[1]);
        assert_eq!(
            store.questions(interview)[0].answer_text.as_deref(),
            Some(EchoTranscriber::expected_text(b"voice").as_str())
        );
    }

    #[tokio::test]
    async fn test_out_of_order_submission_is_conflict() {
        let (store, _, questions) = seeded_store();

        let (status, body) = send(app(store), answer_form(questions[1], b"voice")).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json_body(&body)["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_oversized_audio_is_rejected() {
        let (store, interview, questions) = seeded_store();
        let audio = vec![b'a'; Config::for_tests().max_audio_bytes + 1];

        let (status, _) = send(app(store.clone()), answer_form(questions[0], &audio)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(store.questions(interview)[0].answered_at.is_none());
    }

    #[tokio::test]
    async fn test_toggle_voice_reading_route() {
        let (store, interview, _) = seeded_store();

        let (status, body) = send(
            app(store.clone()),
            post_json(
                &format!("/api/v1/interview/{TOKEN}/toggle_voice_reading"),
                json!({"enabled": true}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"status": "success", "voice_reading": true}));
        assert!(store.interview(interview).unwrap().voice_reading);
    }

    #[tokio::test]
    async fn test_create_interview_issues_token() {
        let (store, _, _) = seeded_store();
        let position = store.insert_position("SRE", "Linux", "值班");
        let candidate = store.insert_candidate(position, "李四", None);

        let (status, body) = send(
            app(store.clone()),
            post_json(
                "/api/v1/interviews",
                json!({"candidate_id": candidate, "interviewer": "王五"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let created = json_body(&body);
        assert_eq!(created["status"], 0);
        let token = created["token"].as_str().unwrap();
        assert_eq!(token.len(), 32);
        assert!(store.find_interview_by_token(token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_interview_for_unknown_candidate() {
        let (store, _, _) = seeded_store();

        let (status, _) = send(
            app(store),
            post_json("/api/v1/interviews", json!({"candidate_id": 4242})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_keeps_token_and_status() {
        let (store, interview, _) = seeded_store();

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/api/v1/interviews/{interview}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"interviewer": "赵六", "is_passed": true}).to_string()))
            .unwrap();
        let (status, body) = send(app(store.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        let updated = json_body(&body);
        assert_eq!(updated["interviewer"], "赵六");
        assert_eq!(updated["token"], TOKEN);
        assert_eq!(updated["status"], 1);
    }

    #[tokio::test]
    async fn test_reissued_token_replaces_old_one() {
        let (store, interview, _) = seeded_store();

        let (status, body) = send(
            app(store.clone()),
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/interviews/{interview}/token"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let token = json_body(&body)["token"].as_str().unwrap().to_string();
        assert_ne!(token, TOKEN);
        assert!(store.find_interview_by_token(TOKEN).await.unwrap().is_none());
        assert!(store.find_interview_by_token(&token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_interview_removes_questions() {
        let (store, interview, _) = seeded_store();
        let delete = |id: i64| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/interviews/{id}"))
                .body(Body::empty())
                .unwrap()
        };

        let (status, _) = send(app(store.clone()), delete(interview)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(store.interview(interview).is_none());
        assert!(store.questions(interview).is_empty());

        let (status, _) = send(app(store), delete(interview)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_download() {
        let (store, interview, _) = seeded_store();
        let uri = format!("/api/v1/interviews/{interview}/report");

        let (status, _) = send(app(store.clone()), get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        store.set_status(interview, InterviewStatus::Completed);
        let report = StoredReport {
            content: b"<html>report</html>".to_vec(),
            content_type: "text/html; charset=utf-8".to_string(),
            degraded: false,
            warning: None,
        };
        assert!(store.save_report(interview, &report).await.unwrap());

        let response = app(store).oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains(&format!("interview_report_{interview}.html")));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html>report</html>");
    }

    #[tokio::test]
    async fn test_report_for_unknown_interview() {
        let (store, _, _) = seeded_store();
        let (status, _) = send(app(store), get("/api/v1/interviews/999/report")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
