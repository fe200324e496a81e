use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use quote_engine::state;
use quote_engine::{OrderId, OrderRepository, OrderState, RepositoryError};

/// One pretty-printed JSON file per order: `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileRepository {
    dir: PathBuf,
}

impl FileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileRepository { dir: dir.into() }
    }

    fn path(&self, id: &OrderId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl OrderRepository for FileRepository {
    fn load(&self, id: &OrderId) -> Result<Option<OrderState>, RepositoryError> {
        let raw = match fs::read_to_string(self.path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(state::decode(&raw)?))
    }

    fn save(&self, id: &OrderId, order: &OrderState) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.dir)?;
        let json = state::encode(order)?;
        // readers never see a half-written record
        let tmp = self.dir.join(format!("{}.json.tmp", id));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path(id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote_engine::{Edit, FieldValue, StateError};

    fn id() -> OrderId { OrderId::parse("feedfacecafebeef").unwrap() }

    #[test]
    fn test_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("orders"));
        assert!(repo.load(&id()).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("orders"));
        let mut st = OrderState::with_images(["/uploads/feedfacecafebeef/a.jpg"]);
        st.apply(Edit::SetForeignPrice { index: 0, value: FieldValue::Number(18.5) }).unwrap();
        repo.save(&id(), &st).unwrap();
        assert_eq!(repo.load(&id()).unwrap(), Some(st));
        assert!(!dir.path().join("orders/feedfacecafebeef.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path());
        fs::write(dir.path().join("feedfacecafebeef.json"), r#"{"rate": true}"#).unwrap();
        assert!(matches!(
            repo.load(&id()),
            Err(RepositoryError::Corrupt(StateError::Corrupt { ref field, .. })) if field == "rate"
        ));
    }
}
