pub mod i18n_service;
