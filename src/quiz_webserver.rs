use std::io;

use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use crate::quiz_server::QuizServerHandle;
use crate::service::{exec_routes, quiz_routes};
use crate::sheet_server::SheetServerHandle;

/// Binds the HTTP server. The reporting endpoint is only mounted when a sheet server is given.
///
/// Binding happens here, before the returned server is awaited, so reports
/// aimed at this process queue on the socket instead of being refused.
pub fn new_webserver(
    quiz: QuizServerHandle,
    sheet: Option<SheetServerHandle>,
    bind_address: &str,
) -> io::Result<Server> {
    let quiz = web::Data::new(quiz);
    let sheet = sheet.map(web::Data::new);
    let server = HttpServer::new(move || {
        let app = App::new()
            .wrap(Logger::default())
            .app_data(quiz.clone())
            .configure(quiz_routes);
        match &sheet {
            Some(sheet) => app.app_data(sheet.clone()).configure(exec_routes),
            None => app,
        }
    })
    .bind(bind_address)?
    .run();
    log::info!("HTTP server listening on {}", bind_address);
    Ok(server)
}
