//! End-to-end tests for workflow runs, from raw stdin text to event lines.

#[cfg(test)]
mod tests {
    use crate::context::{SimulateConfig, WorkflowRequest};
    use crate::core::{WorkflowEvent, WorkflowMode};
    use crate::events::CollectingEventSink;
    use crate::pipeline::{EngineConfig, RecordingSleeper, TimingConfig, WorkflowEngine};
    use crate::stages::{is_active_key, VISION_CHECKS};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn run_raw(raw: &str) -> (Arc<CollectingEventSink>, i32) {
        let sink = Arc::new(CollectingEventSink::new());
        let request = WorkflowRequest::parse(raw).unwrap();
        let config = EngineConfig::new().with_timing(TimingConfig::instant());
        let report = WorkflowEngine::new(&config, sink.clone())
            .run(&request)
            .await
            .unwrap();
        (sink, report.exit_code())
    }

    fn lines(sink: &CollectingEventSink) -> Vec<Value> {
        sink.events()
            .iter()
            .map(|event| serde_json::from_str(&event.to_json_line().unwrap()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_return_run_emits_full_sequence() {
        let (sink, code) = run_raw(r#"{"mode":"return","requestId":"R1"}"#).await;

        assert_eq!(code, 0);
        assert_eq!(
            lines(&sink),
            vec![
                json!({"event":"progress","stage":"starting","message":"요청 R1 장비 명령 준비","mode":"return"}),
                json!({"event":"progress","stage":"prepare","message":"반납 준비 중","mode":"return"}),
                json!({"event":"progress","stage":"verify","message":"반납 물품 시각 검사","mode":"return"}),
                json!({"event":"progress","stage":"stow","message":"보관 구역으로 이동","mode":"return"}),
                json!({"event":"progress","stage":"complete","message":"보관 완료","mode":"return"}),
                json!({"event":"progress","stage":"magazine_top","message":"탄창 최상단 탄알 위치 확인"}),
                json!({"event":"progress","stage":"selector","message":"조정간 위치 확인"}),
                json!({"event":"progress","stage":"serial","message":"총기 QR 코드 확인"}),
                json!({
                    "event":"complete",
                    "status":"success",
                    "stage":"complete",
                    "message":"장비 동작 시뮬레이션 완료",
                    "mode":"return",
                    "summary":{"requestId":"R1","includes":null}
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_failure_at_pick() {
        let (sink, code) = run_raw(
            r#"{"mode":"dispatch","requestId":7,"simulate":{"fail_stage":"pick","reason":"jam"}}"#,
        )
        .await;

        assert_eq!(code, 2);
        assert_eq!(sink.stages(), vec!["starting", "prepare", "pick", "pick"]);
        assert_eq!(
            lines(&sink).last().unwrap(),
            &json!({"event":"complete","status":"error","stage":"pick","message":"jam","mode":"dispatch"})
        );
    }

    #[tokio::test]
    async fn test_empty_object_runs_return() {
        let (sink, code) = run_raw("{}").await;

        assert_eq!(code, 0);
        let all = lines(&sink);
        assert_eq!(all[0]["message"], "요청 - 장비 명령 준비");
        assert_eq!(all[0]["mode"], "return");
        assert_eq!(all.last().unwrap()["summary"], json!({"requestId":null,"includes":null}));
    }

    #[tokio::test]
    async fn test_falsy_request_id_prints_dash() {
        for raw in [r#"{"request_id":""}"#, r#"{"requestId":0}"#] {
            let (sink, code) = run_raw(raw).await;

            assert_eq!(code, 0);
            assert_eq!(lines(&sink)[0]["message"], "요청 - 장비 명령 준비");
        }
    }

    #[tokio::test]
    async fn test_empty_input_behaves_like_empty_object() {
        let (sink, code) = run_raw("").await;

        assert_eq!(code, 0);
        assert_eq!(sink.len(), 9);
    }

    #[tokio::test]
    async fn test_dispatch_never_runs_vision_checks() {
        let (sink, _) = run_raw(r#"{"type":"issue","dispatch":{"includes":{"firearm":true}}}"#).await;

        let stages = sink.stages();
        for check in VISION_CHECKS {
            assert!(!stages.iter().any(|s| s == check.key));
        }
        assert_eq!(
            lines(&sink).last().unwrap()["summary"]["includes"],
            json!({"firearm":true})
        );
    }

    #[tokio::test]
    async fn test_vision_check_failure_uses_default_message() {
        let (sink, code) = run_raw(r#"{"mode":"return","simulate":{"failStage":"selector"}}"#).await;

        assert_eq!(code, 2);
        assert_eq!(
            sink.stages(),
            vec!["starting", "prepare", "verify", "stow", "complete", "magazine_top", "selector", "selector"]
        );
        let last = lines(&sink).pop().unwrap();
        assert_eq!(last["message"], "조정간 위치 확인 실패");
        assert_eq!(last["mode"], "return");
    }

    #[tokio::test]
    async fn test_unknown_fail_stage_runs_everything_first() {
        let (sink, code) = run_raw(r#"{"mode":"return","simulate":{"fail_stage":"teleport"}}"#).await;

        assert_eq!(code, 2);
        assert_eq!(sink.len(), 9);
        let last = lines(&sink).pop().unwrap();
        assert_eq!(last["status"], "error");
        assert_eq!(last["stage"], "unknown");
        assert_eq!(last["message"], "teleport 단계를 찾을 수 없음");
    }

    #[tokio::test]
    async fn test_progress_events_carry_active_keys_only() {
        for raw in [
            r#"{"mode":"dispatch"}"#,
            r#"{"mode":"return"}"#,
            r#"{"type":"dispatch","simulate":{"fail_stage":"verify"}}"#,
        ] {
            let (sink, _) = run_raw(raw).await;
            let events = sink.events();
            let mode = match events.last() {
                Some(WorkflowEvent::Complete(c)) => c.mode.unwrap_or_default(),
                other => panic!("expected terminal event, got {other:?}"),
            };

            for event in &events[1..events.len() - 1] {
                assert!(is_active_key(mode, event.stage()), "{} not active", event.stage());
            }
        }
    }

    #[tokio::test]
    async fn test_exactly_one_terminal_event() {
        for raw in [
            "{}",
            r#"{"mode":"dispatch","simulate":{"fail_stage":"prepare"}}"#,
            r#"{"mode":"return","simulate":{"fail_stage":"serial","reason":"QR 판독 불가"}}"#,
            r#"{"mode":"dispatch","simulate":{"fail_stage":"nowhere"}}"#,
        ] {
            let (sink, _) = run_raw(raw).await;
            let events = sink.events();

            assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
            assert!(events.last().unwrap().is_terminal());
            assert_eq!(events[0].stage(), "starting");
        }
    }

    #[tokio::test]
    async fn test_failure_before_vision_skips_checks() {
        let sink = Arc::new(CollectingEventSink::new());
        let request = WorkflowRequest::new(WorkflowMode::Return)
            .with_simulate(SimulateConfig::fail_at("stow").with_reason("경로 차단"));
        let sleeper = Arc::new(RecordingSleeper::new());
        let config = EngineConfig::new().with_timing(TimingConfig::instant());

        let report = WorkflowEngine::new(&config, sink.clone())
            .with_sleeper(sleeper.clone())
            .run(&request)
            .await
            .unwrap();

        assert_eq!(report.stages.len(), 3);
        // setup + prepare + verify + stow
        assert_eq!(sleeper.durations().len(), 4);
        assert_eq!(sink.stages(), vec!["starting", "prepare", "verify", "stow", "stow"]);
    }
}
