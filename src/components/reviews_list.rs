use leptos::*;
use crate::models::Review;

#[component]
pub fn ReviewsList(reviews: Vec<Review>) -> impl IntoView {
    if reviews.is_empty() {
        return view! { <p>"Ainda sem avaliações do menu."</p> }.into_view();
    }

    view! {
        <ul class="reviews">
            {reviews
                .into_iter()
                .map(|review| {
                    let score = format!("▲ {}  ▼ {}", review.upvotes, review.downvotes);
                    view! {
                        <li>
                            <strong>{review.display_name}</strong>
                            {format!(" ★ {:.1}", review.rating)}
                            <p>{review.comment}</p>
                            <small>{score}</small>
                        </li>
                    }
                })
                .collect_view()}
        </ul>
    }
    .into_view()
}
