pub mod health;
pub mod services;

use crate::error::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound(crate::i18n::t("not_found.route"))
}
