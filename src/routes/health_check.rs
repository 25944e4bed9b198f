use actix_web::HttpResponse;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().body("Hello, your database is connected!")
}
