use reqwest::Client;

use crate::structs::report::{ReportAction, ReportResponse};
use crate::traits::reporter::Reporter;

/// Sends report actions to a spreadsheet-style logging endpoint.
///
/// Every action is delivered on its own task. Failures are logged and dropped,
/// there is no retry queue.
#[derive(Debug, Clone)]
pub struct SheetsReporter {
    client: Client,
    endpoint: Option<String>,
}

impl SheetsReporter {
    pub fn new(endpoint: Option<String>) -> Self {
        SheetsReporter {
            client: Client::new(),
            endpoint,
        }
    }

    // initialize goes out as a GET so browsers hitting the same endpoint skip the CORS preflight
    pub(crate) async fn deliver(
        client: &Client,
        endpoint: &str,
        action: &ReportAction,
    ) -> Result<ReportResponse, reqwest::Error> {
        let request = match action {
            ReportAction::Initialize => client.get(endpoint).query(&[("action", "initialize")]),
            _ => client.post(endpoint).json(action),
        };
        request.send().await?.error_for_status()?.json::<ReportResponse>().await
    }
}

impl Reporter for SheetsReporter {
    fn report(&self, action: ReportAction) {
        let Some(endpoint) = self.endpoint.clone() else {
            log::info!("Reporting endpoint not configured, {} not sent: {:?}", action.name(), action);
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            match SheetsReporter::deliver(&client, &endpoint, &action).await {
                Ok(response) if response.success => {
                    log::debug!("{} delivered: {}", action.name(), response.message.unwrap_or_default());
                }
                Ok(response) => {
                    log::warn!("{} rejected by endpoint: {}", action.name(), response.error.unwrap_or_default());
                }
                Err(e) => {
                    log::error!("Error sending {} to reporting endpoint: {}", action.name(), e);
                }
            }
        });
    }
}

// Collects actions in memory so tests can await them
#[cfg(test)]
pub(crate) struct ChannelReporter(pub tokio::sync::mpsc::UnboundedSender<ReportAction>);

#[cfg(test)]
impl Reporter for ChannelReporter {
    fn report(&self, action: ReportAction) {
        let _ = self.0.send(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::exec_routes;
    use crate::sheet_server::{SheetServer, Table};
    use crate::structs::model::{Participant, Violation, ViolationKind};
    use crate::structs::report::{ParticipantReport, ViolationReport};
    use actix_web::{web, App, HttpServer};

    #[actix_web::test]
    async fn delivers_all_actions_to_the_exec_endpoint() {
        let (server, sheet) = SheetServer::new(":memory:".to_string()).await.unwrap();
        tokio::spawn(server.run());
        let data = web::Data::new(sheet.clone());
        let http = HttpServer::new(move || App::new().app_data(data.clone()).configure(exec_routes))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let endpoint = format!("http://{}/exec", http.addrs()[0]);
        actix_web::rt::spawn(http.run());

        let client = Client::new();
        let initialized = SheetsReporter::deliver(&client, &endpoint, &ReportAction::Initialize).await.unwrap();
        assert!(initialized.success);

        let mut participant = Participant::new("Ada");
        participant.violations.push(Violation::new(ViolationKind::Paste, "Attempted to paste content"));
        let update = ReportAction::UpdateParticipant(ParticipantReport::new(&participant, 15, crate::utils::now()));
        assert!(SheetsReporter::deliver(&client, &endpoint, &update).await.unwrap().success);
        let violation = ReportAction::LogViolation(ViolationReport::new(&participant, &participant.violations[0]));
        assert!(SheetsReporter::deliver(&client, &endpoint, &violation).await.unwrap().success);

        assert_eq!(sheet.count_rows(Table::Participants).await.unwrap(), 1);
        assert_eq!(sheet.count_rows(Table::Answers).await.unwrap(), 0);
        assert_eq!(sheet.count_rows(Table::Violations).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error_not_a_panic() {
        let client = Client::new();
        let result = SheetsReporter::deliver(&client, "http://127.0.0.1:9/exec", &ReportAction::Initialize).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unconfigured_reporter_only_logs() {
        let reporter = SheetsReporter::new(None);
        reporter.report(ReportAction::Initialize);
    }
}
