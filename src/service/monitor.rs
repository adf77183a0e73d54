use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::{AggregatedMessage, AggregatedMessageStream, Session};
use futures_util::StreamExt;
use serde::Serialize;

use crate::detector::Signal;
use crate::quiz_server::QuizServerHandle;
use crate::service::quiz::error_response;
use crate::structs::submit::{SessionStatus, SignalAck, SignalRequest};

/// Frames pushed to the monitor socket
#[derive(Serialize, Debug)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum MonitorMessage {
    Ack(SignalAck),
    Status(SessionStatus),
    Error(String),
}

// Forwards one browser signal. The reply tells the client whether to cancel the native action
pub(crate) async fn signal(req_body: web::Json<SignalRequest>, quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    match quiz.signal(req_body.into_inner().signal).await {
        Ok(ack) => HttpResponse::Ok().json(ack),
        Err(e) => error_response(e),
    }
}

pub(crate) async fn monitor(
    req: HttpRequest,
    stream: web::Payload,
    quiz: web::Data<QuizServerHandle>,
) -> Result<HttpResponse, Error> {
    let (res, session, stream) = actix_ws::handle(&req, stream)?;

    let stream = stream
        .aggregate_continuations()
        // aggregate continuation frames up to 1MiB
        .max_continuation_size(2_usize.pow(20));

    actix_web::rt::spawn(monitor_session(quiz.get_ref().clone(), session, stream));
    Ok(res)
}

/// Relays signals from the socket to the quiz server and pushes every status
/// change back, until either side goes away.
async fn monitor_session(quiz: QuizServerHandle, mut session: Session, mut stream: AggregatedMessageStream) {
    let mut status_rx = quiz.subscribe_status();
    let current = status_rx.borrow_and_update().clone();
    if send(&mut session, &MonitorMessage::Status(current)).await.is_err() {
        return;
    }
    log::info!("Monitor connected");

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(AggregatedMessage::Text(text))) => {
                    let reply = match serde_json::from_str::<Signal>(&text) {
                        Ok(signal) => match quiz.signal(signal).await {
                            Ok(ack) => MonitorMessage::Ack(ack),
                            Err(e) => {
                                log::error!("Dropping monitor connection: {}", e);
                                break;
                            }
                        },
                        Err(e) => MonitorMessage::Error(e.to_string()),
                    };
                    if send(&mut session, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(AggregatedMessage::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Some(Ok(AggregatedMessage::Close(reason))) => {
                    log::info!("Monitor disconnected: {:?}", reason);
                    let _ = session.close(reason).await;
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("Monitor socket error: {}", e);
                    break;
                }
                None => break,
            },
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                if send(&mut session, &MonitorMessage::Status(status)).await.is_err() {
                    break;
                }
            }
        }
    }

    log::info!("Monitor disconnected");
    let _ = session.close(None).await;
}

async fn send(session: &mut Session, message: &MonitorMessage) -> Result<(), actix_ws::Closed> {
    match serde_json::to_string(message) {
        Ok(text) => session.text(text).await,
        Err(e) => {
            log::error!("Failed to encode monitor frame: {}", e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use super::*;
    use crate::questions::SCIENCE_QUESTIONS;
    use crate::quiz_server::QuizServer;
    use crate::reporter::ChannelReporter;
    use crate::service::quiz_routes;

    #[actix_web::test]
    async fn signal_endpoint_acknowledges_suppression() {
        let (tx, _reports) = mpsc::unbounded_channel();
        let (server, quiz) = QuizServer::new(SCIENCE_QUESTIONS.clone(), 30, Arc::new(ChannelReporter(tx)));
        tokio::spawn(server.run());
        quiz.register("Ada").await.unwrap();
        let app = actix_test::init_service(App::new().app_data(web::Data::new(quiz)).configure(quiz_routes)).await;

        let req = actix_test::TestRequest::post()
            .uri("/api/signal")
            .set_json(json!({"signal": {"kind": "key_down", "key": "c", "ctrl": true}}))
            .to_request();
        let ack: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack["suppress"], true);

        let req = actix_test::TestRequest::post()
            .uri("/api/signal")
            .set_json(json!({"signal": {"kind": "focus_lost"}}))
            .to_request();
        let ack: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(ack["suppress"], false);

        let req = actix_test::TestRequest::post()
            .uri("/api/signal")
            .set_json(json!({"signal": {"kind": "teleport"}}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn monitor_frames_are_tagged() {
        let frame = serde_json::to_value(MonitorMessage::Ack(SignalAck { suppress: true })).unwrap();
        assert_eq!(frame, json!({"type": "ack", "data": {"suppress": true}}));
        let frame = serde_json::to_value(MonitorMessage::Error("bad frame".to_string())).unwrap();
        assert_eq!(frame, json!({"type": "error", "data": "bad frame"}));
    }
}
