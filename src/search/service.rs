//! Stack Exchange API client
//!
//! Runs the two-call search protocol: `/search/advanced` for candidate
//! questions, then one batched `/answers/{ids}` lookup for their accepted
//! answers. Questions are paired to answers by id and returned in the order
//! the API ranked them.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::request::DEFAULT_FILTER;
use super::{
    Answer, Question, SearchError, SearchRequest, SearchResult, Searchable, DEFAULT_BASE_URL,
};

/// Path of the answers-by-ids endpoint, relative to the API root
const ANSWERS_ENDPOINT: &str = "/answers";

/// Response envelope shared by every API method
///
/// Items are kept as raw JSON so each one can be mapped (and rejected)
/// on its own.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<Value>,
    quota_max: Option<i64>,
    quota_remaining: Option<i64>,
    error_id: Option<i64>,
    error_message: Option<String>,
    error_name: Option<String>,
}

/// Client for the Stack Exchange search API
#[derive(Debug, Clone)]
pub struct StackExchange {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl Default for StackExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl StackExchange {
    /// Creates a client against the public API without a key
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            ..Self::new()
        }
    }

    /// Points the client at another API root (stub servers, other versions)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the key sent with every request for a higher quota
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Sends a GET and decodes the response envelope
    ///
    /// `url` must not carry the API key; it is what errors and logs report.
    async fn get(&self, url: Url) -> Result<ApiResponse, SearchError> {
        let display_url = url.to_string();
        let mut send_url = url;
        if let Some(ref key) = self.api_key {
            send_url.query_pairs_mut().append_pair("key", key);
        }

        debug!(url = %display_url, "GET");
        let response = self
            .client
            .get(send_url)
            .send()
            .await
            .map_err(|e| SearchError::request(&display_url, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::request(&display_url, e))?;

        let api_response: ApiResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(SearchError::MalformedResponse(format!(
                    "undecodable body from {}: {}",
                    display_url, e
                )));
            }
            Err(_) => return Err(SearchError::request(&display_url, format!("HTTP {}", status))),
        };

        if let Some(message) = api_response.error_message.clone() {
            debug!(
                error_id = ?api_response.error_id,
                error_name = ?api_response.error_name,
                "API reported an error"
            );
            return Err(SearchError::request(&display_url, message));
        }
        if !status.is_success() {
            return Err(SearchError::request(&display_url, format!("HTTP {}", status)));
        }

        if let (Some(remaining), Some(max)) = (api_response.quota_remaining, api_response.quota_max)
        {
            debug!(remaining, max, "API quota");
        }

        Ok(api_response)
    }

    /// Runs `/search/advanced` and maps the first `num` items to questions
    async fn fetch_questions(&self, request: &SearchRequest) -> Result<Vec<Question>, SearchError> {
        let url = request.search_url(&self.base_url)?;
        let response = self.get(url).await?;

        if response.items.is_empty() {
            return Err(SearchError::ZeroSearchResults);
        }

        response
            .items
            .iter()
            .take(request.num())
            .map(Question::from_item)
            .collect()
    }

    /// Looks up all `ids` in a single `/answers/{ids}` call
    async fn fetch_answers(&self, ids: &[u64], site: &str) -> Result<Vec<Answer>, SearchError> {
        let joined = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(";");
        let endpoint = format!("{}{}/{}", self.base_url, ANSWERS_ENDPOINT, joined);
        // The answer body is always needed, whatever filter the search used.
        let url = Url::parse_with_params(&endpoint, [("filter", DEFAULT_FILTER), ("site", site)])
            .map_err(|e| SearchError::request(&endpoint, format!("invalid url: {}", e)))?;

        let response = self.get(url).await?;
        response.items.iter().map(Answer::from_item).collect()
    }
}

/// Pairs each question with its accepted answer, keeping question order
///
/// Questions without an accepted answer, or whose answer is missing or not
/// flagged accepted, are dropped.
pub fn pair_results(questions: Vec<Question>, answers: Vec<Answer>) -> Vec<SearchResult> {
    let by_id: HashMap<u64, Answer> = answers
        .into_iter()
        .filter(|a| a.is_accepted)
        .map(|a| (a.answer_id, a))
        .collect();

    questions
        .into_iter()
        .filter_map(|question| {
            let answer_id = question.accepted_answer_id?;
            match by_id.get(&answer_id) {
                Some(answer) => Some(SearchResult::new(question, answer.clone())),
                None => {
                    debug!(
                        question_id = question.question_id,
                        answer_id, "accepted answer not returned; dropping question"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Accepted answer ids in question order, without duplicates
fn accepted_answer_ids(questions: &[Question]) -> Vec<u64> {
    let mut seen = HashSet::new();
    questions
        .iter()
        .filter_map(|q| q.accepted_answer_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

#[async_trait]
impl Searchable for StackExchange {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let questions = self.fetch_questions(request).await?;

        let ids = accepted_answer_ids(&questions);
        if ids.is_empty() {
            warn!("none of the matched questions has an accepted answer");
            return Ok(Vec::new());
        }

        let answers = self.fetch_answers(&ids, request.site()).await?;
        Ok(pair_results(questions, answers))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::fixtures::{answer, question};
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn question_item(id: u64, accepted_answer_id: Option<u64>) -> Value {
        serde_json::to_value(question(id, accepted_answer_id)).unwrap()
    }

    fn answer_item(id: u64) -> Value {
        let mut item = serde_json::to_value(answer(id)).unwrap();
        item["question_id"] = json!(id);
        item
    }

    fn envelope(items: Vec<Value>) -> Value {
        json!({
            "items": items,
            "has_more": false,
            "quota_max": 300,
            "quota_remaining": 299
        })
    }

    fn request(num: usize) -> SearchRequest {
        SearchRequest::builder("Reverse a linked list", "stackoverflow")
            .num(num)
            .accepted_only()
            .build()
            .unwrap()
    }

    async fn mount_search(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/search/advanced"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_answers(server: &MockServer, body: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/answers/.+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> StackExchange {
        StackExchange::new().with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_search_pairs_questions_with_answers() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            envelope(vec![question_item(1, Some(1)), question_item(2, Some(2))]),
        )
        .await;
        mount_answers(&server, envelope(vec![answer_item(2), answer_item(1)]), 1).await;

        let results = client(&server).search(&request(10)).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].question.question_id, 1);
        assert_eq!(results[1].question.question_id, 2);
        for r in &results {
            assert_eq!(Some(r.answer.answer_id), r.question.accepted_answer_id);
            assert!(r.answer.is_accepted);
        }
    }

    #[tokio::test]
    async fn test_search_truncates_to_num_before_pairing() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            envelope(vec![question_item(1, Some(1)), question_item(2, Some(2))]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/answers/1"))
            .and(query_param("site", "stackoverflow"))
            .and(query_param("filter", "withbody"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![answer_item(1)])))
            .expect(1)
            .mount(&server)
            .await;

        let results = client(&server).search(&request(1)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].answer.answer_id, 1);
    }

    #[tokio::test]
    async fn test_search_batches_answer_ids_with_semicolons() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            envelope(vec![
                question_item(10, Some(11)),
                question_item(20, None),
                question_item(30, Some(31)),
            ]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/answers/11;31"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(vec![answer_item(11), answer_item(31)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let results = client(&server).search(&request(10)).await.unwrap();

        let ids: Vec<u64> = results.iter().map(|r| r.question.question_id).collect();
        assert_eq!(ids, vec![10, 30]);
    }

    #[tokio::test]
    async fn test_empty_items_is_zero_results_without_answer_call() {
        let server = MockServer::start().await;
        mount_search(&server, envelope(vec![])).await;
        mount_answers(&server, envelope(vec![]), 0).await;

        let err = client(&server).search(&request(5)).await.unwrap_err();

        assert!(matches!(err, SearchError::ZeroSearchResults));
    }

    #[tokio::test]
    async fn test_error_message_is_stack_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/advanced"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error_id": 502,
                "error_message": "too many requests from this IP",
                "error_name": "throttle_violation"
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_answers(&server, envelope(vec![]), 0).await;

        let err = client(&server).search(&request(5)).await.unwrap_err();

        match err {
            SearchError::StackRequest { url, message } => {
                assert_eq!(message, "too many requests from this IP");
                assert!(url.contains("/search/advanced"));
            }
            other => panic!("expected StackRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_answer_drops_only_that_question() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            envelope(vec![question_item(1, Some(1)), question_item(2, Some(2))]),
        )
        .await;
        mount_answers(&server, envelope(vec![answer_item(2)]), 1).await;

        let results = client(&server).search(&request(10)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].question.question_id, 2);
    }

    #[tokio::test]
    async fn test_no_accepted_answers_skips_answer_call() {
        let server = MockServer::start().await;
        mount_search(&server, envelope(vec![question_item(1, None)])).await;
        mount_answers(&server, envelope(vec![]), 0).await;

        let results = client(&server).search(&request(10)).await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_question_fails_fast() {
        let server = MockServer::start().await;
        mount_search(
            &server,
            envelope(vec![json!({"question_id": 1, "title": "no body"})]),
        )
        .await;
        mount_answers(&server, envelope(vec![]), 0).await;

        let err = client(&server).search(&request(10)).await.unwrap_err();

        assert!(matches!(err, SearchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_without_body_is_stack_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/advanced"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = client(&server).search(&request(10)).await.unwrap_err();

        match err {
            SearchError::StackRequest { message, .. } => assert!(message.contains("503")),
            other => panic!("expected StackRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_key_is_sent_but_not_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/advanced"))
            .and(query_param("key", "secret-key"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error_id": 400,
                "error_message": "bad parameter",
                "error_name": "bad_parameter"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).with_api_key(Some("secret-key".to_string()));
        let err = client.search(&request(10)).await.unwrap_err();

        assert!(!err.to_string().contains("secret-key"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_stack_request_error() {
        // Nothing listens on port 9 of localhost in the test environment.
        let client = StackExchange::new().with_base_url("http://127.0.0.1:9");

        let err = client.search(&request(1)).await.unwrap_err();

        assert!(matches!(err, SearchError::StackRequest { .. }));
    }

    #[test]
    fn test_pair_results_discards_unaccepted_answers() {
        let mut not_accepted = answer(1);
        not_accepted.is_accepted = false;

        let results = pair_results(vec![question(1, Some(1))], vec![not_accepted]);

        assert!(results.is_empty());
    }

    #[test]
    fn test_pair_results_keeps_question_order() {
        let questions = vec![question(3, Some(3)), question(1, Some(1)), question(2, Some(2))];
        let answers = vec![answer(1), answer(2), answer(3)];

        let results = pair_results(questions, answers);

        let ids: Vec<u64> = results.iter().map(|r| r.question.question_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_accepted_answer_ids_dedupes_in_order() {
        let questions = vec![question(1, Some(5)), question(2, None), question(3, Some(5))];
        assert_eq!(accepted_answer_ids(&questions), vec![5]);
    }
}
