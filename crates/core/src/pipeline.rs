//! End-to-end analysis of one video URL.

use crate::{
    ai::{AnalysisRequest, Analyzer, Facet, TextModel},
    error::{Result, TldwError},
    session::SessionStore,
    settings::AnalysisSettings,
    types::SessionRecord,
    validate::{extract_video_id, validate_transcript, validate_youtube_url},
    youtube::{CaptionError, CaptionSource, MetadataClient},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    VideoInfo,
    Captions,
    Analysis,
    Save,
}

/// Progress callbacks; every method defaults to doing nothing
pub trait Progress {
    fn step_started(&mut self, _step: Step) {}
    fn step_finished(&mut self, _step: Step, _detail: &str) {}
    fn facet_started(&mut self, _facet: Facet) {}
}

pub struct NoProgress;

impl Progress for NoProgress {}

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub url: String,
    pub settings: AnalysisSettings,
    /// Persist the finished record when a store is available
    pub save: bool,
}

/// External collaborators of one run
pub struct PipelineDeps<'a, M, C> {
    pub metadata: &'a MetadataClient,
    pub captions: &'a C,
    pub analyzer: &'a Analyzer<M>,
    pub store: Option<&'a SessionStore>,
}

/// URL check, video info, captions, analysis and optional save, in that
/// order. Only URL and caption problems abort the run; metadata and
/// individual facets degrade.
pub async fn analyze_video<M, C, P>(
    request: &AnalyzeRequest,
    deps: &PipelineDeps<'_, M, C>,
    progress: &mut P,
) -> Result<SessionRecord>
where
    M: TextModel,
    C: CaptionSource,
    P: Progress,
{
    let url = request.url.trim();
    if !validate_youtube_url(url) {
        return Err(TldwError::InvalidUrl {
            url: url.to_string(),
        });
    }
    let video_id = extract_video_id(url).ok_or_else(|| TldwError::MissingVideoId {
        url: url.to_string(),
    })?;
    tracing::info!(video_id = %video_id, "analysis started");

    progress.step_started(Step::VideoInfo);
    let video_info = deps.metadata.video_info(&video_id, url).await;
    progress.step_finished(Step::VideoInfo, &video_info.title);

    progress.step_started(Step::Captions);
    let transcript = deps.captions.fetch(&video_id).await?;
    if !validate_transcript(&transcript) {
        return Err(CaptionError::NoCaptions.into());
    }
    progress.step_finished(
        Step::Captions,
        &format!(
            "{} segments, {}",
            transcript.total_segments,
            transcript.language_codes.join(", ")
        ),
    );

    progress.step_started(Step::Analysis);
    let analysis = deps
        .analyzer
        .analyze_with(
            &AnalysisRequest {
                transcript: &transcript.text,
                video_info: &video_info,
                settings: &request.settings,
            },
            |facet| progress.facet_started(facet),
        )
        .await;
    progress.step_finished(Step::Analysis, request.settings.summary_type.label());

    let mut record = SessionRecord::new(
        url,
        video_info,
        transcript,
        analysis,
        request.settings.clone(),
    );

    if let (true, Some(store)) = (request.save, deps.store) {
        progress.step_started(Step::Save);
        let session_id = store.save(&mut record)?;
        progress.step_finished(Step::Save, &session_id);
    }

    tracing::info!(
        video_id = %record.video_info.video_id,
        session_id = %record.session_id,
        "analysis finished"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ai::ModelError,
        types::TranscriptData,
        youtube::{RawSegment, build_transcript},
    };

    struct FixedCaptions(Option<TranscriptData>);

    impl CaptionSource for FixedCaptions {
        async fn fetch(&self, _video_id: &str) -> Result<TranscriptData> {
            self.0.clone().ok_or(TldwError::Captions(CaptionError::Restricted))
        }
    }

    struct CannedModel;

    impl TextModel for CannedModel {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.contains("Generate the summary") {
                Ok("Short summary".to_string())
            } else {
                Err(ModelError::Other("unscripted".to_string()).into())
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<Step>,
        facets: Vec<Facet>,
    }

    impl Progress for Recorder {
        fn step_started(&mut self, step: Step) {
            self.steps.push(step);
        }

        fn facet_started(&mut self, facet: Facet) {
            self.facets.push(facet);
        }
    }

    fn transcript() -> TranscriptData {
        build_transcript(
            vec![RawSegment::new(0.0, 2.0, "hello there")],
            vec!["en".to_string()],
        )
    }

    fn request(url: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            url: url.to_string(),
            settings: AnalysisSettings::default(),
            save: true,
        }
    }

    #[tokio::test]
    async fn test_pipeline_runs_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let metadata = MetadataClient::new(None);
        let captions = FixedCaptions(Some(transcript()));
        let analyzer = Analyzer::new(CannedModel);
        let deps = PipelineDeps {
            metadata: &metadata,
            captions: &captions,
            analyzer: &analyzer,
            store: Some(&store),
        };
        let mut progress = Recorder::default();

        let record = analyze_video(
            &request("https://youtu.be/abc12345678"),
            &deps,
            &mut progress,
        )
        .await
        .unwrap();

        assert_eq!(record.video_info.video_id, "abc12345678");
        assert_eq!(record.analysis.main_summary, "Short summary");
        assert!(record.analysis.key_takeaways.is_empty());
        assert_eq!(
            progress.steps,
            vec![Step::VideoInfo, Step::Captions, Step::Analysis, Step::Save]
        );
        assert_eq!(progress.facets.first(), Some(&Facet::Summary));

        let loaded = store.load(&record.session_id).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_pipeline_without_save() {
        let metadata = MetadataClient::new(None);
        let captions = FixedCaptions(Some(transcript()));
        let analyzer = Analyzer::new(CannedModel);
        let deps = PipelineDeps {
            metadata: &metadata,
            captions: &captions,
            analyzer: &analyzer,
            store: None,
        };
        let record = analyze_video(
            &request("https://www.youtube.com/watch?v=abc12345678"),
            &deps,
            &mut NoProgress,
        )
        .await
        .unwrap();
        assert!(record.session_id.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_rejects_bad_url() {
        let metadata = MetadataClient::new(None);
        let captions = FixedCaptions(Some(transcript()));
        let analyzer = Analyzer::new(CannedModel);
        let deps = PipelineDeps {
            metadata: &metadata,
            captions: &captions,
            analyzer: &analyzer,
            store: None,
        };
        let err = analyze_video(&request("https://vimeo.com/123"), &deps, &mut NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, TldwError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_pipeline_surfaces_caption_errors() {
        let metadata = MetadataClient::new(None);
        let captions = FixedCaptions(None);
        let analyzer = Analyzer::new(CannedModel);
        let deps = PipelineDeps {
            metadata: &metadata,
            captions: &captions,
            analyzer: &analyzer,
            store: None,
        };
        let err = analyze_video(
            &request("https://youtu.be/abc12345678"),
            &deps,
            &mut NoProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TldwError::Captions(CaptionError::Restricted)));
    }
}
