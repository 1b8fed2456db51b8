//! A stand-in clinic REST API served on an ephemeral port, plus helpers to
//! drive the BFF against it.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{cookie::Cookie, dev::ServiceResponse, test, web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use serde_json::{json, Value};

use patitas_web::api::state::AppState;
use patitas_web::domain::session::repository::SessionStore;
use patitas_web::infrastructure::http::backend_client::BackendClient;
use patitas_web::infrastructure::memory::session_store::InMemorySessionStore;

pub const COOKIE: &str = "patitas_session";
pub const REVOKED_TOKEN: &str = "tok-revocado";

struct Account {
    email: String,
    password: String,
    token: String,
    usuario: Value,
}

pub struct ClinicStub {
    accounts: Mutex<Vec<Account>>,
    pub mascota_reads: AtomicUsize,
    pub cita_updates: Mutex<Vec<Value>>,
    pub usuario_updates: Mutex<Vec<(String, Value)>>,
}

impl ClinicStub {

    fn new() -> Self {
        let account = |id: u64, nombre: &str, email: &str, rol: &str, token: &str| Account {
            email: email.to_string(),
            password: "secreto1".to_string(),
            token: token.to_string(),
            usuario: json!({ "id": id, "nombre": nombre, "email": email, "rol": rol }),
        };

        ClinicStub {
            accounts: Mutex::new(vec![
                account(1, "Ana", "ana@patitas.com", "admin", "tok-admin"),
                account(2, "Sofía", "sofia@patitas.com", "recepcionista", "tok-recepcion"),
                account(3, "Raúl", "raul@patitas.com", "cliente", REVOKED_TOKEN),
                account(4, "Luis", "luis@patitas.com", "veterinario", "tok-vet"),
            ]),
            mascota_reads: AtomicUsize::new(0),
            cita_updates: Mutex::new(Vec::new()),
            usuario_updates: Mutex::new(Vec::new()),
        }
    }

    pub fn mascota_reads(&self) -> usize {
        self.mascota_reads.load(Ordering::SeqCst)
    }

    pub fn usuario(&self, email: &str) -> Option<Value> {
        self.accounts
            .lock()
            .iter()
            .find(|a| a.email == email)
            .map(|a| a.usuario.clone())
    }

    fn usuario_for(&self, req: &HttpRequest) -> Option<Value> {
        let token = req
            .headers()
            .get("Authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?
            .to_string();

        if token == REVOKED_TOKEN {
            return None;
        }

        self.accounts
            .lock()
            .iter()
            .find(|a| a.token == token)
            .map(|a| a.usuario.clone())
    }
}

fn expired() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "success": false, "message": "Token inválido" }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn login(stub: web::Data<ClinicStub>, body: web::Json<Value>) -> HttpResponse {
    let accounts = stub.accounts.lock();
    let found = accounts
        .iter()
        .find(|a| body["email"] == a.email.as_str() && body["password"] == a.password.as_str());

    match found {
        Some(account) => HttpResponse::Ok().json(json!({
            "success": true,
            "token": account.token,
            "usuario": account.usuario,
        })),
        None => HttpResponse::Unauthorized().json(json!({ "success": false, "message": "Credenciales inválidas" })),
    }
}

async fn registro(stub: web::Data<ClinicStub>, body: web::Json<Value>) -> HttpResponse {
    let mut accounts = stub.accounts.lock();
    let email = body["email"].as_str().unwrap_or_default().to_string();

    if accounts.iter().any(|a| a.email == email) {
        return HttpResponse::Conflict().json(json!({ "success": false, "message": "El email ya está registrado" }));
    }

    let id = accounts.len() as u64 + 1;
    accounts.push(Account {
        email: email.clone(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
        token: format!("tok-{}", id),
        usuario: json!({
            "id": id,
            "nombre": body["nombre"],
            "email": email,
            "rol": body.get("rol").cloned().unwrap_or(json!("cliente")),
        }),
    });

    HttpResponse::Created().json(json!({ "success": true, "message": "Usuario registrado exitosamente" }))
}

async fn perfil(stub: web::Data<ClinicStub>, req: HttpRequest) -> HttpResponse {
    match stub.usuario_for(&req) {
        Some(usuario) => HttpResponse::Ok().json(json!({ "success": true, "usuario": usuario })),
        None => expired(),
    }
}

async fn list_mascotas(stub: web::Data<ClinicStub>, req: HttpRequest) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }
    stub.mascota_reads.fetch_add(1, Ordering::SeqCst);

    HttpResponse::Ok().json(json!({
        "success": true,
        "mascotas": [
            { "id": 1, "nombre": "Toby", "especie": "Perro", "raza": "Beagle", "esterilizado": true },
            { "id": 2, "nombre": "Michi", "especie": "Gato", "fecha_nacimiento": "2021-03-15T00:00:00.000Z" }
        ]
    }))
}

async fn create_mascota(stub: web::Data<ClinicStub>, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }
    if body["nombre"] == "Toby" {
        return HttpResponse::Conflict().json(json!({ "message": "duplicate key" }));
    }

    let mut mascota = body.into_inner();
    mascota["id"] = json!(3);
    HttpResponse::Created().json(json!({ "success": true, "mascota": mascota }))
}

async fn get_mascota(stub: web::Data<ClinicStub>, req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }

    match path.as_str() {
        "1" => HttpResponse::Ok().json(json!({
            "success": true,
            "mascota": { "id": 1, "nombre": "Toby", "especie": "Perro", "fecha_nacimiento": "2020-05-04T00:00:00.000Z" }
        })),
        _ => HttpResponse::Ok().json(json!({ "success": false, "message": "Mascota no encontrada" })),
    }
}

async fn delete_mascota(stub: web::Data<ClinicStub>, req: HttpRequest) -> HttpResponse {
    match stub.usuario_for(&req) {
        Some(_) => HttpResponse::NoContent().finish(),
        None => expired(),
    }
}

async fn list_citas(stub: web::Data<ClinicStub>, req: HttpRequest) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }

    HttpResponse::Ok().json(json!({
        "success": true,
        "citas": [
            { "id": 7, "mascota": { "nombre": "Toby" }, "fecha": "2024-03-15", "hora": "09:30", "motivo": "Vacunación", "estado": "programada" },
            { "id": 8, "mascota": { "nombre": "Michi" }, "fecha": "2024-03-16", "hora": "10:00", "motivo": "Control", "estado": "completada" }
        ]
    }))
}

async fn update_cita(stub: web::Data<ClinicStub>, req: HttpRequest, path: web::Path<String>, body: web::Json<Value>) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }

    let body = body.into_inner();
    stub.cita_updates.lock().push(body.clone());
    HttpResponse::Ok().json(json!({ "success": true, "cita": { "id": path.into_inner(), "estado": body["estado"] } }))
}

async fn list_usuarios(stub: web::Data<ClinicStub>, req: HttpRequest) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }

    let usuarios: Vec<Value> = stub.accounts.lock().iter().map(|a| a.usuario.clone()).collect();
    HttpResponse::Ok().json(json!({ "success": true, "usuarios": usuarios }))
}

async fn update_usuario(stub: web::Data<ClinicStub>, req: HttpRequest, path: web::Path<String>, body: web::Json<Value>) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }

    let id = path.into_inner();
    let body = body.into_inner();
    stub.usuario_updates.lock().push((id.clone(), body.clone()));

    let mut accounts = stub.accounts.lock();
    let account = match accounts.iter_mut().find(|a| a.usuario["id"].to_string() == id) {
        Some(account) => account,
        None => return HttpResponse::NotFound().json(json!({ "success": false, "message": "Usuario no encontrado" })),
    };

    if let (Some(usuario), Some(changes)) = (account.usuario.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            if key != "password" {
                usuario.insert(key.clone(), value.clone());
            }
        }
    }
    HttpResponse::Ok().json(json!({ "success": true, "usuario": account.usuario }))
}

async fn change_password(stub: web::Data<ClinicStub>, req: HttpRequest, path: web::Path<String>, body: web::Json<Value>) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }

    let id = path.into_inner();
    let mut accounts = stub.accounts.lock();
    let account = match accounts.iter_mut().find(|a| a.usuario["id"].to_string() == id) {
        Some(account) => account,
        None => return HttpResponse::NotFound().json(json!({ "success": false, "message": "Usuario no encontrado" })),
    };

    if body["currentPassword"] != account.password.as_str() {
        return HttpResponse::BadRequest().json(json!({ "success": false, "message": "Contraseña actual incorrecta" }));
    }

    account.password = body["newPassword"].as_str().unwrap_or_default().to_string();
    HttpResponse::Ok().json(json!({ "success": true, "message": "Contraseña actualizada" }))
}

async fn list_historiales(stub: web::Data<ClinicStub>, req: HttpRequest) -> HttpResponse {
    if stub.usuario_for(&req).is_none() {
        return expired();
    }
    HttpResponse::Ok().json(json!([]))
}

/// Starts the stub and returns it with its base URL (`http://127.0.0.1:<port>/api`).
pub async fn spawn_clinic() -> (Arc<ClinicStub>, String) {
    let stub = Arc::new(ClinicStub::new());
    let data = web::Data::from(Arc::clone(&stub));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health))
                    .route("/auth/login", web::post().to(login))
                    .route("/auth/registro", web::post().to(registro))
                    .route("/auth/perfil", web::get().to(perfil))
                    .route("/mascotas", web::get().to(list_mascotas))
                    .route("/mascotas", web::post().to(create_mascota))
                    .route("/mascotas/{id}", web::get().to(get_mascota))
                    .route("/mascotas/{id}", web::delete().to(delete_mascota))
                    .route("/citas", web::get().to(list_citas))
                    .route("/citas/{id}", web::put().to(update_cita))
                    .route("/usuarios", web::get().to(list_usuarios))
                    .route("/usuarios/{id}", web::put().to(update_usuario))
                    .route("/usuarios/{id}/password", web::put().to(change_password))
                    .route("/historiales", web::get().to(list_historiales))
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("stub clinic API should bind");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    (stub, format!("http://{}/api", addr))
}

pub fn bff_state(base_url: &str) -> AppState {
    let client = BackendClient::init(base_url, Duration::from_secs(5)).expect("valid base url");
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(client.clone()));
    AppState::new(client, sessions, COOKIE)
}

/// Builds the BFF service exactly as `main` wires it.
macro_rules! bff_app {
    ($state:expr) => {{
        let state = $state.clone();
        let guard = state.guard();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(patitas_web::routes::public_routes)
                .configure(|cfg| patitas_web::routes::private_routes(cfg, guard)),
        )
        .await
    }};
}

pub fn login_request(email: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": email, "password": password }))
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == COOKIE)
        .map(|c| c.into_owned())
}

pub fn messages(body: &Value) -> Vec<String> {
    body["notifications"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|n| n["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
