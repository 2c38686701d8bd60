//! Spoken and notification texts (tr-TR)

pub const CAMERA_ACCESS_FAILED: &str = "Kamera erişimi sağlanamadı. Lütfen izinleri kontrol edin.";
pub const CAMERA_ERROR_TITLE: &str = "Kamera hatası";
pub const CAMERA_ERROR_BODY: &str = "Kamera erişimi için izin gerekli";

pub const SNAPSHOT_FAILED: &str = "Fotoğraf çekilemedi. Lütfen tekrar deneyin.";
pub const SNAPSHOT_ERROR_TITLE: &str = "Kamera hatası";
pub const SNAPSHOT_ERROR_BODY: &str = "Fotoğraf çekilemedi";

pub const PHOTO_CAPTURED: &str = "Fotoğraf çekildi. Analiz etmek için butona basın.";
pub const PHOTO_SELECTED: &str = "Fotoğraf seçildi. Analiz etmek için butona basın.";
pub const NO_PHOTO_YET: &str = "Lütfen önce bir fotoğraf çekin";

pub const ANALYSIS_FAILED: &str = "Analiz sırasında bir hata oluştu. Lütfen tekrar deneyin.";
pub const ANALYSIS_ERROR_TITLE: &str = "Hata";
pub const ANALYSIS_ERROR_BODY: &str = "Analiz başarısız oldu";
