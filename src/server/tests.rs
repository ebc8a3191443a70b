use super::*;
use crate::catalog::Book;

fn sample_recommendation() -> Recommendation {
    Recommendation {
        book: Book {
            isbn13: 9_780_000_000_001,
            title: "Dune".to_string(),
            authors: "Frank Herbert;Brian Herbert".to_string(),
            description: "word ".repeat(40),
            average_rating: 4.25,
            published_year: Some(1965),
            num_pages: Some(412),
            thumbnail: Some("http://img/1".to_string()),
        },
        similarity: 0.87,
    }
}

#[test]
fn book_card_formats_authors_and_truncates_description() {
    let card = BookCard::from(&sample_recommendation());

    assert_eq!(card.authors, "Frank Herbert and Brian Herbert");
    assert!(card.description.ends_with("..."));
    assert_eq!(card.description.split_whitespace().count(), 30);
    assert_eq!(card.thumbnail.as_deref(), Some("http://img/1"));
}

#[test]
fn http_error_status_mapping() {
    let bad_request = HttpError(BookrecError::InvalidArgument("top_k".to_string()));
    assert_eq!(bad_request.into_response().status(), StatusCode::BAD_REQUEST);

    let bad_gateway = HttpError(BookrecError::Store("down".to_string()));
    assert_eq!(bad_gateway.into_response().status(), StatusCode::BAD_GATEWAY);

    let internal = HttpError(BookrecError::Embedding("boom".to_string()));
    assert_eq!(
        internal.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn widget_markup_is_embedded() {
    assert!(WIDGET_HTML.contains("/api/search"));
    assert!(WIDGET_HTML.contains("<form"));
}
