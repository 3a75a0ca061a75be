use launchpad_core::reconcile::{fetch_failed, reconcile, FinalResult, Reconciled};
use launchpad_core::results::CategoryResults;

use crate::submit::CrewEndpoint;

/// Poll the final result once and reconcile it.
///
/// Never fails: any transport, status or decoding problem becomes the
/// generic "Failed to fetch results" outcome, so the caller always reaches
/// a terminal state.
pub async fn fetch_final<R: CategoryResults>(
    http: &reqwest::Client,
    endpoint: &CrewEndpoint,
    analysis_id: &str,
) -> Reconciled<R> {
    let url = endpoint.analysis_url();
    let resp = match endpoint
        .authorize(http.get(&url).query(&[("id", analysis_id)]))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(analysis_id, error = %e, "final result fetch failed");
            return fetch_failed();
        }
    };

    let status = resp.status();
    if !status.is_success() {
        tracing::warn!(analysis_id, %status, "final result fetch rejected");
        return fetch_failed();
    }

    match resp.json::<FinalResult<R>>().await {
        Ok(payload) => {
            let reconciled = reconcile(payload);
            tracing::info!(
                analysis_id,
                completed = reconciled.outcome.is_completed(),
                "analysis reconciled"
            );
            reconciled
        }
        Err(e) => {
            tracing::warn!(analysis_id, error = %e, "final result undecodable");
            fetch_failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::kind::PipelineKind;
    use launchpad_core::reconcile::{Outcome, ResultSource, FETCH_FAILED_MESSAGE};
    use launchpad_core::results::{StrengthsResults, SuggestionsResults};
    use mockito::Matcher;

    fn endpoint(url: &str, kind: PipelineKind) -> CrewEndpoint {
        CrewEndpoint::new(Some(url), kind).unwrap()
    }

    #[tokio::test]
    async fn failed_payload_keeps_partial_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/crew/strengths")
            .match_query(Matcher::UrlEncoded("id".into(), "a-9".into()))
            .with_status(200)
            .with_body(
                r#"{"analysis_id":"a-9","agent":"strengths","status":"failed",
                    "error":"tech_lead exhausted retries",
                    "result":{"finance_strengths":["strong margins"]}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let ep = endpoint(&server.url(), PipelineKind::Strengths);
        let r = fetch_final::<StrengthsResults>(&reqwest::Client::new(), &ep, "a-9").await;
        assert_eq!(r.outcome.error(), Some("tech_lead exhausted retries"));
        assert_eq!(
            r.outcome.results().unwrap().finance_strengths,
            vec!["strong margins"]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn suggestions_reconstructed_from_pipeline() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/crew/suggestions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"status":"completed","pipeline":{"analysis_id":"a-2","pipeline_status":"completed",
                    "agents":[{"agent_name":"finance_advisor","display_name":"Finance Suggestions",
                               "status":"completed","result":["A"]}]}}"#,
            )
            .create_async()
            .await;

        let ep = endpoint(&server.url(), PipelineKind::Suggestions);
        let r = fetch_final::<SuggestionsResults>(&reqwest::Client::new(), &ep, "a-2").await;
        match r.outcome {
            Outcome::Completed { results, source } => {
                assert_eq!(source, ResultSource::Reconstructed);
                assert_eq!(results.finance_suggestions, vec!["A"]);
            }
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_is_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/crew/strengths")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":"Analysis not found"}"#)
            .create_async()
            .await;

        let ep = endpoint(&server.url(), PipelineKind::Strengths);
        let r = fetch_final::<StrengthsResults>(&reqwest::Client::new(), &ep, "gone").await;
        assert_eq!(r.outcome.error(), Some(FETCH_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn unreachable_server_is_fetch_failure() {
        let ep = endpoint("http://127.0.0.1:9", PipelineKind::Strengths);
        let r = fetch_final::<StrengthsResults>(&reqwest::Client::new(), &ep, "a-1").await;
        assert_eq!(r.outcome.error(), Some(FETCH_FAILED_MESSAGE));
    }
}
