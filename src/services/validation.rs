use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::domain::cita::model::CitaForm;
use crate::domain::historial::model::HistorialForm;
use crate::domain::mascota::model::MascotaForm;
use crate::domain::usuario::model::{LoginForm, PasswordChange, PerfilForm, RegistroForm, UsuarioForm};
use crate::utils::errors::ApiError;
use crate::utils::format::parse_date;

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn valid_email(email: &str) -> bool {
    static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email.trim()))
}

fn finish(errors: Vec<String>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn check_email(email: &str, errors: &mut Vec<String>) {
    if blank(email) {
        errors.push("El email es requerido".to_string());
    } else if !valid_email(email) {
        errors.push("El email no es válido".to_string());
    }
}

pub fn validate_login(form: &LoginForm) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    check_email(&form.email, &mut errors);
    if form.password.is_empty() {
        errors.push("La contraseña es requerida".to_string());
    }
    finish(errors)
}

pub fn validate_registro(form: &RegistroForm) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if blank(&form.nombre) {
        errors.push("El nombre es requerido".to_string());
    }
    check_email(&form.email, &mut errors);
    if form.password.is_empty() {
        errors.push("La contraseña es requerida".to_string());
    } else if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!("La contraseña debe tener al menos {} caracteres", MIN_PASSWORD_LENGTH));
    }
    finish(errors)
}

pub fn validate_perfil(form: &PerfilForm) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if blank(&form.nombre) {
        errors.push("El nombre es requerido".to_string());
    }
    if blank(&form.telefono) {
        errors.push("El teléfono es requerido".to_string());
    }
    if blank(&form.direccion) {
        errors.push("La dirección es requerida".to_string());
    }
    finish(errors)
}

pub fn validate_mascota(form: &MascotaForm, today: NaiveDate) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if blank(&form.nombre) {
        errors.push("El nombre de la mascota es requerido".to_string());
    }
    if blank(&form.especie) {
        errors.push("La especie es requerida".to_string());
    }
    if let Some(sexo) = &form.sexo {
        if !["Macho", "Hembra"].iter().any(|s| s.eq_ignore_ascii_case(sexo.trim())) {
            errors.push("El sexo debe ser Macho o Hembra".to_string());
        }
    }
    if let Some(fecha) = &form.fecha_nacimiento {
        match parse_date(fecha) {
            Some(date) if date > today => {
                errors.push("La fecha de nacimiento no puede ser futura".to_string())
            },
            Some(_) => {},
            None => errors.push("La fecha de nacimiento no es válida".to_string()),
        }
    }
    finish(errors)
}

/// Past dates are only rejected when `creating`, so old appointments stay editable.
pub fn validate_cita(form: &CitaForm, today: NaiveDate, creating: bool) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if form.mascota_id.is_none() {
        errors.push("Debes seleccionar una mascota".to_string());
    }

    if blank(&form.fecha) {
        errors.push("La fecha es requerida".to_string());
    } else {
        match NaiveDate::parse_from_str(form.fecha.trim(), "%Y-%m-%d") {
            Ok(date) if creating && date < today => {
                errors.push("La fecha de la cita no puede ser anterior a hoy".to_string())
            },
            Ok(_) => {},
            Err(_) => errors.push("La fecha debe tener el formato AAAA-MM-DD".to_string()),
        }
    }

    if blank(&form.hora) {
        errors.push("La hora es requerida".to_string());
    } else if NaiveTime::parse_from_str(form.hora.trim(), "%H:%M").is_err() {
        errors.push("La hora debe tener el formato HH:MM".to_string());
    }

    if blank(&form.motivo) {
        errors.push("El motivo es requerido".to_string());
    }
    finish(errors)
}

pub fn validate_historial(form: &HistorialForm) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if form.id_mascota.is_none() {
        errors.push("Debes seleccionar una mascota".to_string());
    }
    for vacuna in &form.vacunas {
        for fecha in [&vacuna.fecha, &vacuna.proxima_fecha].into_iter().flatten() {
            if parse_date(fecha).is_none() {
                errors.push(format!("La vacuna {} tiene una fecha no válida", vacuna.nombre.trim()));
            }
        }
    }
    finish(errors)
}

pub fn validate_usuario(form: &UsuarioForm, creating: bool) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if blank(&form.nombre) {
        errors.push("El nombre es requerido".to_string());
    }
    check_email(&form.email, &mut errors);
    if form.rol.is_none() {
        errors.push("El rol es requerido".to_string());
    }
    match &form.password {
        None if creating => errors.push("La contraseña es requerida".to_string()),
        Some(password) if password.chars().count() < MIN_PASSWORD_LENGTH => {
            errors.push(format!("La contraseña debe tener al menos {} caracteres", MIN_PASSWORD_LENGTH))
        },
        _ => {},
    }
    finish(errors)
}

pub fn validate_password_change(change: &PasswordChange) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if change.current_password.is_empty() {
        errors.push("La contraseña actual es requerida".to_string());
    }
    if change.new_password.is_empty() {
        errors.push("La nueva contraseña es requerida".to_string());
    } else {
        if change.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(format!("La nueva contraseña debe tener al menos {} caracteres", MIN_PASSWORD_LENGTH));
        }
        if change.new_password == change.current_password {
            errors.push("La nueva contraseña debe ser diferente a la actual".to_string());
        }
    }
    finish(errors)
}
