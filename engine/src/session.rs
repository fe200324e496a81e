use thiserror::Error;

use crate::edit::{Edit, EditError};
use crate::repository::{OrderId, OrderRepository, RepositoryError};
use crate::{LineItem, OrderState, Quote};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl OrderState {
    /// Re-aligns items with the images currently stored for the order.
    /// Stored items are matched by url; new images get a fresh item, and
    /// items whose image is gone are dropped.
    pub fn merge_images(&mut self, urls: &[String]) {
        let mut previous = std::mem::take(&mut self.items);
        self.items = urls
            .iter()
            .map(|url| match previous.iter().position(|it| &it.image_url == url) {
                Some(pos) => previous.swap_remove(pos),
                None => LineItem::new(url.clone()),
            })
            .collect();
    }
}

/// An order being priced. Every change is written back to the repository
/// as a full record.
pub struct QuoteSession<'r, R: OrderRepository + ?Sized> {
    repo: &'r R,
    id: OrderId,
    state: OrderState,
}

impl<'r, R: OrderRepository + ?Sized> QuoteSession<'r, R> {
    /// `images` is `None` when the order has no image folder; stored items are
    /// then kept untouched.
    pub fn open(repo: &'r R, id: OrderId, images: Option<&[String]>) -> Result<Self, RepositoryError> {
        let state = match (repo.load(&id)?, images) {
            (Some(mut st), Some(urls)) => {
                st.merge_images(urls);
                st
            }
            (Some(st), None) => st,
            (None, Some(urls)) => OrderState::with_images(urls.iter().cloned()),
            (None, None) => OrderState::default(),
        };
        Ok(QuoteSession { repo, id, state })
    }

    /// Writes `state` over whatever is stored, readable or not.
    pub fn overwrite(repo: &'r R, id: OrderId, state: OrderState) -> Result<Self, RepositoryError> {
        repo.save(&id, &state)?;
        Ok(QuoteSession { repo, id, state })
    }

    pub fn id(&self) -> &OrderId { &self.id }
    pub fn state(&self) -> &OrderState { &self.state }
    pub fn quote(&self) -> Quote { Quote::for_order(&self.state) }

    /// The in-memory state changes only once the edited record is saved.
    pub fn apply(&mut self, edit: Edit) -> Result<&OrderState, SessionError> {
        let mut next = self.state.clone();
        next.apply(edit)?;
        self.repo.save(&self.id, &next)?;
        self.state = next;
        Ok(&self.state)
    }
}
