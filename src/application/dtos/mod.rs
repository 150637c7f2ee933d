pub mod i18n_dto;
