use actix_web::web;

pub mod admin;
pub mod exec;
pub mod monitor;
pub mod quiz;

pub(crate) fn quiz_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/register", web::post().to(quiz::register))
            .route("/question", web::get().to(quiz::question))
            .route("/submit", web::post().to(quiz::submit))
            .route("/signal", web::post().to(monitor::signal))
            .route("/status", web::get().to(quiz::status))
            .route("/results", web::get().to(quiz::results))
            .route("/restart", web::post().to(quiz::restart))
            .route("/admin", web::get().to(admin::admin)),
    )
    .route("/ws/monitor", web::get().to(monitor::monitor));
}

// The reporting endpoint. Initialize also answers GET so it can be triggered from a browser
pub(crate) fn exec_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/exec", web::post().to(exec::exec))
        .route("/exec", web::get().to(exec::initialize));
}
