// tests/pipeline_test.rs — Integration test: notebook pipeline with mock collaborators

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use research_notebook::core::pipeline::{NotebookPipeline, NotebookRequest};
use research_notebook::core::types::{LoopConfig, ProgressEvent};
use research_notebook::core::writer::write_rounds;
use research_notebook::infra::errors::NotebookError;
use research_notebook::provider::gateway::CompletionGateway;
use research_notebook::sources::github::{
    CommitQuery, CommitRecord, CommitSelection, CommitSource, FileDiff,
};
use research_notebook::sources::references::{Reference, ReferenceFetcher};

struct MockCommits {
    fail: bool,
}

#[async_trait]
impl CommitSource for MockCommits {
    async fn fetch_commits(&self, _query: &CommitQuery) -> Result<Vec<CommitRecord>, NotebookError> {
        if self.fail {
            return Err(NotebookError::fetch("github", "Request failed, status code 404"));
        }
        Ok(vec![CommitRecord {
            message: "Add attention dropout".into(),
            committed_date: Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap(),
            sha: "0123456789abcdef".into(),
            author_name: "Sam".into(),
            author_email: "sam@example.com".into(),
            url: "https://github.com/acme/widgets/commit/0123456".into(),
            diffs: vec![FileDiff {
                filename: "model.py".into(),
                additions: 3,
                deletions: 1,
                patch: "+ self.drop = nn.Dropout(p)".into(),
            }],
        }])
    }
}

/// Fails for any URL containing "broken".
struct MockFetcher;

#[async_trait]
impl ReferenceFetcher for MockFetcher {
    async fn fetch_reference(&self, url: &str) -> Result<Reference, NotebookError> {
        if url.contains("broken") {
            return Err(NotebookError::fetch("reference", "status 500"));
        }
        Ok(Reference {
            title: format!("Title of {url}"),
            excerpt: "Dropout randomly zeroes activations {p}.".into(),
        })
    }
}

/// Counts calls and answers with the call number.
#[derive(Default)]
struct CountingGateway {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionGateway for CountingGateway {
    async fn complete(&self, prompt: &str) -> Result<String, NotebookError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("response {}", prompts.len()))
    }
}

fn notes_file(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("notes.md");
    std::fs::write(&path, content).unwrap();
    path
}

fn request(notes_path: PathBuf, links: &[&str]) -> NotebookRequest {
    NotebookRequest {
        commits: CommitQuery {
            repo_url: "https://github.com/acme/widgets".into(),
            branch: "main".into(),
            selection: CommitSelection::Latest(1),
        },
        reference_links: links.iter().map(|s| s.to_string()).collect(),
        notes_path,
    }
}

fn pipeline(
    gateway: Arc<CountingGateway>,
    fail_github: bool,
    iterations: u32,
    summarize: bool,
) -> NotebookPipeline {
    NotebookPipeline::new(
        Arc::new(MockCommits { fail: fail_github }),
        Arc::new(MockFetcher),
        gateway,
        LoopConfig {
            iterations,
            summarize,
        },
    )
}

#[tokio::test]
async fn test_assembled_prompt_sections_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_file(&dir, "LayerNorm placement was confusing.");
    let gateway = Arc::new(CountingGateway::default());
    let p = pipeline(gateway, false, 0, false);

    let prompt = p
        .assemble(&request(notes, &["https://a.example", "https://b.example"]))
        .await
        .unwrap();
    let text = prompt.document.render().unwrap();

    let gh = text.find("Commit(0123456): Add attention dropout").unwrap();
    let refs = text.find("### Title of https://a.example").unwrap();
    let notes_at = text.find("LayerNorm placement was confusing.").unwrap();
    assert!(gh < refs && refs < notes_at);
    // Braces inside fetched text survive rendering.
    assert!(text.contains("zeroes activations {p}."));
    assert!(text.contains("Number of commits: 1"));
}

#[tokio::test]
async fn test_one_failing_link_of_three() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_file(&dir, "notes");
    let p = pipeline(Arc::new(CountingGateway::default()), false, 0, false);

    let prompt = p
        .assemble(&request(
            notes,
            &["https://a.example", "https://broken.example", "https://c.example"],
        ))
        .await
        .unwrap();
    let text = prompt.document.render().unwrap();

    let a = text.find("### Title of https://a.example").unwrap();
    let broken = text.find("[error fetching https://broken.example").unwrap();
    let c = text.find("### Title of https://c.example").unwrap();
    assert!(a < broken && broken < c);
}

#[tokio::test]
async fn test_github_failure_aborts_before_any_completion() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_file(&dir, "notes");
    let gateway = Arc::new(CountingGateway::default());
    let p = pipeline(gateway.clone(), true, 2, false);

    let err = p.run(&request(notes, &[])).await.unwrap_err();
    assert!(matches!(err, NotebookError::Fetch { ref collaborator, .. } if collaborator == "github"));
    assert!(gateway.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_notes_aborts() {
    let gateway = Arc::new(CountingGateway::default());
    let p = pipeline(gateway.clone(), false, 1, false);

    let err = p
        .run(&request(PathBuf::from("/nonexistent/notes.md"), &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, NotebookError::Fetch { ref collaborator, .. } if collaborator == "notes"));
    assert!(gateway.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_call_count_without_summary() {
    for k in [0u32, 1, 3] {
        let dir = tempfile::tempdir().unwrap();
        let notes = notes_file(&dir, "notes");
        let gateway = Arc::new(CountingGateway::default());

        let outcome = pipeline(gateway.clone(), false, k, false)
            .run(&request(notes, &[]))
            .await
            .unwrap();

        assert_eq!(gateway.prompts.lock().unwrap().len() as u32, 1 + 2 * k);
        assert_eq!(outcome.rounds.len() as u32, k);
    }
}

#[tokio::test]
async fn test_call_count_with_summary() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_file(&dir, "notes");
    let gateway = Arc::new(CountingGateway::default());

    let outcome = pipeline(gateway.clone(), false, 2, true)
        .run(&request(notes, &[]))
        .await
        .unwrap();

    assert_eq!(gateway.prompts.lock().unwrap().len(), 7);
    assert_eq!(outcome.rounds[0].summary.as_deref(), Some("response 4"));
    assert_eq!(outcome.rounds[1].before, "response 3");
    assert_eq!(outcome.final_response(), "response 6");
}

#[tokio::test]
async fn test_critique_sees_instructions_not_data() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_file(&dir, "secret-note-marker");
    let gateway = Arc::new(CountingGateway::default());

    pipeline(gateway.clone(), false, 1, false)
        .run(&request(notes, &[]))
        .await
        .unwrap();

    let prompts = gateway.prompts.lock().unwrap();
    assert!(prompts[0].contains("secret-note-marker"));
    assert!(!prompts[1].contains("secret-note-marker"));
    assert!(prompts[1].contains("response 1"));
    assert!(prompts[2].contains("response 1"));
    assert!(prompts[2].contains("response 2"));
}

#[tokio::test]
async fn test_progress_and_written_files() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_file(&dir, "notes");
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let outcome = pipeline(Arc::new(CountingGateway::default()), false, 2, false)
        .with_progress(move |e| sink.lock().unwrap().push(e))
        .run(&request(notes, &[]))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&ProgressEvent::Generated { chars: 10 }));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Complete { rounds: 2, calls: 5 })
    );

    let out = dir.path().join("notebook_iterations");
    let paths = write_rounds(&out, &outcome.rounds).unwrap();
    assert_eq!(paths.len(), 2);
    let second = std::fs::read_to_string(&paths[1]).unwrap();
    assert!(second.contains("## Initial Response\nresponse 3"));
    assert!(second.contains("## Revised Response\nresponse 5"));
}
