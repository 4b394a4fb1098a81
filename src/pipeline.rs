//! The daily pipeline: fetch → parse → reflect → render → dispatch.
//!
//! Every collaborator is injected through [`PipelineDeps`]. Any failure before
//! dispatch aborts the run and nothing is sent.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::config::Zone;
use crate::delivery::{Dispatcher, MailTransport, RecipientProvider, RunSummary};
use crate::error::Result;
use crate::readings::{ReadingsFetcher, ReadingsParser};
use crate::reflection::ReflectionProvider;
use crate::render::MessageRenderer;

/// External collaborators of a run.
pub struct PipelineDeps {
    pub fetcher: Arc<dyn ReadingsFetcher>,
    pub reflection: Arc<dyn ReflectionProvider>,
    pub recipients: Arc<dyn RecipientProvider>,
    pub transport: Arc<dyn MailTransport>,
}

/// One configured pipeline, reusable across runs.
pub struct DailyPipeline {
    fetcher: Arc<dyn ReadingsFetcher>,
    parser: ReadingsParser,
    reflection: Arc<dyn ReflectionProvider>,
    renderer: MessageRenderer,
    dispatcher: Dispatcher,
    zone: Zone,
}

impl DailyPipeline {
    pub fn new(deps: PipelineDeps, zone: Zone) -> Self {
        Self {
            fetcher: deps.fetcher,
            parser: ReadingsParser::new(),
            reflection: deps.reflection,
            renderer: MessageRenderer::new(zone),
            dispatcher: Dispatcher::new(deps.recipients, deps.transport),
            zone,
        }
    }

    /// Run for today's date in the configured zone.
    pub async fn run_today(&self) -> Result<RunSummary> {
        self.run(self.zone.today()).await
    }

    /// Run once for `date`.
    pub async fn run(&self, date: NaiveDate) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id, %date);

        async {
            info!(reflection = self.reflection.name(), "Pipeline run started");
            match self.execute(date).await {
                Ok(summary) => {
                    info!(
                        success = summary.success_count,
                        failed = summary.failure_count,
                        "Pipeline run finished"
                    );
                    Ok(summary)
                }
                Err(e) => {
                    error!(error = %e, "Pipeline run aborted, nothing sent");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, date: NaiveDate) -> Result<RunSummary> {
        let raw = self.fetcher.fetch(date).await?;
        let iso_date = date.format("%Y-%m-%d").to_string();
        let readings = self.parser.parse(&raw.body, &iso_date, &raw.url)?;
        info!(feast = %readings.feast_name, "Readings parsed");

        let reflection = self.reflection.reflect(&readings).await?;
        let message = self.renderer.render(&readings, &reflection);

        Ok(self.dispatcher.dispatch(message).await?)
    }
}
