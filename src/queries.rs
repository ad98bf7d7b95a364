//! Social-network analytic queries composed from the loader, matrix
//! primitives and traversal kernels.
//!
//! Every query takes relations that were already loaded against shared vertex
//! indices and returns unsorted rows keyed by dense id. Relations loaded
//! against an open index may lag behind its final length; queries widen
//! operands to a common shape before combining them, including the extent of
//! any mask passed in, so ids that appeared later simply match nothing.
//! Messages are the concatenation of comments followed by posts.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    SnbGraphError,
    algebra::{Lor, Plus, PlusTimes, Rational, Scalar, reciprocal},
    config::ScoreWeights,
    index::VertexIndex,
    mask::Mask,
    matrix::SparseMatrix,
    ops::{self, Axis},
    score::{ScoreBoard, ScoreRow},
    traversal::TraversalEngine,
    vector::SparseVector,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ThreadInitiator {
    pub person: usize,
    pub thread_count: u64,
    pub message_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionPath {
    pub person1: usize,
    pub person2: usize,
    pub weight: Rational,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MutualFriends {
    pub person: usize,
    pub mutual_friends: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PosterCount {
    pub person: usize,
    pub posts: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForumCount {
    pub forum: usize,
    pub posts: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: usize,
    pub count: u64,
}

/// Score rows of [`topic_posters`], broken down into replies, likes and
/// messages.
pub type TopicPoster = ScoreRow<u64>;

/// Creator and reply-of relations of comments and posts.
#[derive(Clone, Copy, Debug)]
pub struct MessageRelations<'a> {
    pub comment_hascreator_person: &'a SparseMatrix<u64>,
    pub post_hascreator_person: &'a SparseMatrix<u64>,
    pub comment_replyof_comment: &'a SparseMatrix<u64>,
    pub comment_replyof_post: &'a SparseMatrix<u64>,
}

impl MessageRelations<'_> {
    fn comments(&self) -> usize {
        self.comment_hascreator_person
            .nrows()
            .max(self.comment_replyof_comment.nrows())
            .max(self.comment_replyof_comment.ncols())
            .max(self.comment_replyof_post.nrows())
    }

    fn posts(&self) -> usize {
        self.post_hascreator_person
            .nrows()
            .max(self.comment_replyof_post.ncols())
    }

    fn persons(&self) -> usize {
        self.comment_hascreator_person
            .ncols()
            .max(self.post_hascreator_person.ncols())
    }
}

/// Tag relations of comments and posts.
#[derive(Clone, Copy, Debug)]
pub struct TagRelations<'a> {
    pub comment_hastag_tag: &'a SparseMatrix<u64>,
    pub post_hastag_tag: &'a SparseMatrix<u64>,
}

/// Like relations from persons to comments and posts.
#[derive(Clone, Copy, Debug)]
pub struct LikeRelations<'a> {
    pub person_likes_comment: &'a SparseMatrix<u64>,
    pub person_likes_post: &'a SparseMatrix<u64>,
}

fn widen<T: Scalar>(matrix: &SparseMatrix<T>, nrows: usize, ncols: usize) -> SparseMatrix<T> {
    let nrows = nrows.max(matrix.nrows());
    let ncols = ncols.max(matrix.ncols());
    if matrix.shape() == (nrows, ncols) {
        matrix.clone()
    } else {
        matrix.resize(nrows, ncols)
    }
}

fn extent(masks: &[Option<&Mask>]) -> usize {
    masks.iter().flatten().map(|mask| mask.bound()).max().unwrap_or(0)
}

// Diagonal 0/1 matrix over the stored positions of `vector`.
fn selection<T: Scalar>(vector: &SparseVector<T>) -> Result<SparseMatrix<u64>, SnbGraphError> {
    let size = vector.size();
    SparseMatrix::from_triplets(size, size, vector.iter().map(|(i, _)| (i, i, 1u64)), |_, v| v)
}

/// Rows stored in column `col`.
pub fn column_mask<T: Scalar>(matrix: &SparseMatrix<T>, col: usize) -> Result<Mask, SnbGraphError> {
    Ok(matrix.extract_col(col)?.to_mask())
}

/// Persons located in any city that is part of `country`.
pub fn persons_in_country<T: Scalar>(
    person_islocatedin_place: &SparseMatrix<T>,
    place_ispartof_place: &SparseMatrix<T>,
    country: usize,
) -> Result<Mask, SnbGraphError> {
    let places = person_islocatedin_place
        .ncols()
        .max(place_ispartof_place.nrows())
        .max(place_ispartof_place.ncols())
        .max(country + 1);
    let located = widen(person_islocatedin_place, 0, places);
    let cities = column_mask(&widen(place_ispartof_place, places, places), country)?;
    let persons = ops::select(&located, None, Some(&cities))?;
    Ok(Mask::from_vector(&ops::reduce_rows(&persons.pattern(), &Lor)))
}

/// Per person: threads started (posts created) and messages in those threads
/// (the posts plus replies at every depth).
#[instrument(skip_all)]
pub fn thread_initiators(
    engine: &TraversalEngine,
    relations: &MessageRelations<'_>,
    post_mask: Option<&Mask>,
    comment_mask: Option<&Mask>,
) -> Result<Vec<ThreadInitiator>, SnbGraphError> {
    let comments = relations.comments().max(extent(&[comment_mask]));
    let posts = relations.posts().max(extent(&[post_mask]));
    let persons = relations.persons();

    let post_person = ops::select(
        &widen(relations.post_hascreator_person, posts, persons),
        post_mask,
        None,
    )?;
    let thread_count = ops::reduce_cols(&post_person, &Plus);

    let replies = ops::select(
        &widen(relations.comment_replyof_post, comments, posts),
        comment_mask,
        post_mask,
    )?;
    let direct = ops::mxm(&post_person.transpose(), &replies.transpose(), &PlusTimes)?;
    let reply_tree = ops::select(
        &widen(relations.comment_replyof_comment, comments, comments),
        comment_mask,
        comment_mask,
    )?;
    let closure = engine.transitive_closure(&direct, &reply_tree, &PlusTimes)?;
    let replies_per_person = ops::reduce_rows(&closure.reachable.apply(|_| 1u64), &Plus);
    let message_count = thread_count.ewise_add(&replies_per_person, &Plus)?;
    debug!(
        persons,
        threads = post_person.nvals(),
        replies = closure.reachable.nvals(),
        depth = closure.iterations,
        "thread initiators computed"
    );

    Ok((0..persons)
        .map(|person| ThreadInitiator {
            person,
            thread_count: thread_count.get(person).unwrap_or(0),
            message_count: message_count.get(person).unwrap_or(0),
        })
        .collect())
}

/// Triangles in the friendship graph, restricted to `persons` when given.
pub fn friend_triangles(
    engine: &TraversalEngine,
    person_knows_person: &SparseMatrix<bool>,
    persons: Option<&Mask>,
) -> Result<u64, SnbGraphError> {
    engine.triangle_count(person_knows_person, persons)
}

/// Interaction-weighted distances between two person sets.
///
/// Two friends interact once for every comment one of them wrote in reply to
/// a message by the other; the edge weight is the reciprocal of their total
/// interaction count, kept as an exact fraction so both shortest-path
/// strategies agree. Only reachable, distinct pairs are returned.
#[instrument(skip_all, fields(sources = sources.len(), destinations = destinations.len()))]
pub fn interaction_paths(
    engine: &TraversalEngine,
    relations: &MessageRelations<'_>,
    person_knows_person: &SparseMatrix<bool>,
    sources: &Mask,
    destinations: &Mask,
) -> Result<Vec<InteractionPath>, SnbGraphError> {
    let comments = relations.comments();
    let posts = relations.posts();
    let persons = relations
        .persons()
        .max(person_knows_person.nrows())
        .max(person_knows_person.ncols())
        .max(extent(&[Some(sources), Some(destinations)]));

    let comment_person = widen(relations.comment_hascreator_person, comments, persons);
    let message_person = message_rows(
        &comment_person,
        &widen(relations.post_hascreator_person, posts, persons),
    )?;
    let comment_replyof_message = message_cols(
        &widen(relations.comment_replyof_comment, comments, comments),
        &widen(relations.comment_replyof_post, comments, posts),
    )?;

    let replied_to = ops::mxm(
        &message_person.transpose(),
        &comment_replyof_message.transpose(),
        &PlusTimes,
    )?;
    let interactions = ops::mxm(&replied_to, &comment_person, &PlusTimes)?;
    let knows = widen(person_knows_person, persons, persons);
    let interactions = ops::mask_structure(&interactions, &knows)?;
    let interactions = ops::symmetrize(&interactions, &Plus)?;
    let weights = SparseMatrix::from_triplets(
        persons,
        persons,
        interactions
            .iter()
            .filter_map(|(a, b, count)| reciprocal(count).map(|weight| (a, b, weight))),
        |_, v| v,
    )?;
    debug!(edges = weights.nvals(), "interaction weights built");

    let distances = engine.shortest_paths(&weights, sources, Some(destinations))?;
    Ok(distances
        .iter()
        .filter(|(person1, person2, _)| person1 != person2)
        .map(|(person1, person2, weight)| InteractionPath {
            person1,
            person2,
            weight,
        })
        .collect())
}

/// Posters of messages carrying `tag`, scored by replies, likes and message
/// count under `weights`.
#[instrument(skip_all, fields(tag = tag))]
pub fn topic_posters(
    messages: &MessageRelations<'_>,
    tags: &TagRelations<'_>,
    likes: &LikeRelations<'_>,
    tag: usize,
    weights: &ScoreWeights,
) -> Result<Vec<TopicPoster>, SnbGraphError> {
    let comments = messages
        .comments()
        .max(tags.comment_hastag_tag.nrows())
        .max(likes.person_likes_comment.ncols());
    let posts = messages
        .posts()
        .max(tags.post_hastag_tag.nrows())
        .max(likes.person_likes_post.ncols());
    let persons = messages
        .persons()
        .max(likes.person_likes_comment.nrows())
        .max(likes.person_likes_post.nrows());
    let tag_count = tags
        .comment_hastag_tag
        .ncols()
        .max(tags.post_hastag_tag.ncols())
        .max(tag + 1);

    let message_tag = message_rows(
        &widen(tags.comment_hastag_tag, comments, tag_count),
        &widen(tags.post_hastag_tag, posts, tag_count),
    )?;
    let message_person = message_rows(
        &widen(messages.comment_hascreator_person, comments, persons),
        &widen(messages.post_hascreator_person, posts, persons),
    )?;
    let comment_replyof_message = message_cols(
        &widen(messages.comment_replyof_comment, comments, comments),
        &widen(messages.comment_replyof_post, comments, posts),
    )?;
    let person_likes_message = message_cols(
        &widen(likes.person_likes_comment, persons, comments),
        &widen(likes.person_likes_post, persons, posts),
    )?;

    let tagged = column_mask(&message_tag, tag)?;
    let replies = ops::reduce_cols(&comment_replyof_message, &Plus).select(&tagged)?;
    let liked = ops::reduce_cols(&person_likes_message, &Plus).select(&tagged)?;

    let mut board = ScoreBoard::new(persons);
    board.add_component(
        "replies",
        ops::vxm(&replies, &message_person, &PlusTimes)?,
        weights.reply,
    )?;
    board.add_component(
        "likes",
        ops::vxm(&liked, &message_person, &PlusTimes)?,
        weights.like,
    )?;
    board.add_component(
        "messages",
        ops::reduce_cols(&ops::select(&message_person, Some(&tagged), None)?, &Plus),
        weights.message,
    )?;
    board.rows()
}

/// Post counts per creator over the posts contained in `forums`.
pub fn top_posters(
    forum_containerof_post: &SparseMatrix<u64>,
    post_hascreator_person: &SparseMatrix<u64>,
    forums: &Mask,
) -> Result<Vec<PosterCount>, SnbGraphError> {
    let posts = forum_containerof_post
        .ncols()
        .max(post_hascreator_person.nrows());
    let contained = ops::select(
        &widen(forum_containerof_post, forums.bound(), posts),
        Some(forums),
        None,
    )?;
    let post_mask = Mask::from_vector(&ops::reduce_cols(&contained, &Plus));
    let authored = ops::select(&widen(post_hascreator_person, posts, 0), Some(&post_mask), None)?;
    Ok(ops::reduce_cols(&authored, &Plus)
        .iter()
        .map(|(person, posts)| PosterCount { person, posts })
        .collect())
}

/// The `limit` forums with most members among `members`; ties go to the
/// lower sparse id in `forums`.
pub fn largest_forums(
    forum_hasmember_person: &SparseMatrix<u64>,
    forums: &VertexIndex,
    members: &Mask,
    limit: usize,
) -> Result<Mask, SnbGraphError> {
    let membership = ops::select(
        &widen(forum_hasmember_person, 0, members.bound()),
        None,
        Some(members),
    )?;
    let mut counts = ops::reduce_rows(&membership, &Plus)
        .iter()
        .map(|(forum, count)| forums.reverse(forum).map(|sparse| (forum, count, sparse)))
        .collect::<Result<Vec<_>, SnbGraphError>>()?;
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    Ok(counts.into_iter().take(limit).map(|(forum, _, _)| forum).collect())
}

/// Tags of comments replying to a message tagged `tag`, for replies that do
/// not carry `tag` themselves.
#[instrument(skip_all, fields(tag = tag))]
pub fn related_topics(
    messages: &MessageRelations<'_>,
    tags: &TagRelations<'_>,
    tag: usize,
) -> Result<Vec<TagCount>, SnbGraphError> {
    let comments = messages.comments().max(tags.comment_hastag_tag.nrows());
    let posts = messages.posts().max(tags.post_hastag_tag.nrows());
    let tag_count = tags
        .comment_hastag_tag
        .ncols()
        .max(tags.post_hastag_tag.ncols())
        .max(tag + 1);

    let comment_tag = widen(tags.comment_hastag_tag, comments, tag_count);
    let comments_with_tag = comment_tag.extract_col(tag)?;
    let posts_with_tag = widen(tags.post_hastag_tag, posts, tag_count).extract_col(tag)?;

    let post_replies = ops::mxv(
        &widen(messages.comment_replyof_post, comments, posts),
        &posts_with_tag,
        &PlusTimes,
    )?;
    let comment_replies = ops::mxv(
        &widen(messages.comment_replyof_comment, comments, comments),
        &comments_with_tag,
        &PlusTimes,
    )?;
    let replies = post_replies
        .ewise_add(&comment_replies, &Plus)?
        .select_complement(&comments_with_tag.to_mask())
        .apply(|_| 1u64);

    Ok(ops::vxm(&replies, &comment_tag, &PlusTimes)?
        .iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect())
}

/// Posts per forum among posts carrying any tag in `tags`, optionally
/// restricted to `forums`.
pub fn popular_topics(
    forum_containerof_post: &SparseMatrix<u64>,
    post_hastag_tag: &SparseMatrix<u64>,
    tags: &Mask,
    forums: Option<&Mask>,
) -> Result<Vec<ForumCount>, SnbGraphError> {
    let posts = forum_containerof_post.ncols().max(post_hastag_tag.nrows());
    let tagged = ops::select(&widen(post_hastag_tag, posts, tags.bound()), None, Some(tags))?;
    let post_mask = Mask::from_vector(&ops::reduce_rows(&tagged, &Plus));
    let contained = ops::select(
        &widen(forum_containerof_post, extent(&[forums]), posts),
        forums,
        Some(&post_mask),
    )?;
    Ok(ops::reduce_rows(&contained, &Plus)
        .iter()
        .map(|(forum, posts)| ForumCount { forum, posts })
        .collect())
}

/// Friends of friends of `person` who are interested in `tag`, excluding
/// `person` and their direct friends, with the number of friends they share.
#[instrument(skip_all, fields(person = person, tag = tag))]
pub fn friend_recommendations(
    person_knows_person: &SparseMatrix<bool>,
    person_hasinterest_tag: &SparseMatrix<u64>,
    person: usize,
    tag: usize,
) -> Result<Vec<MutualFriends>, SnbGraphError> {
    let persons = person_knows_person
        .nrows()
        .max(person_knows_person.ncols())
        .max(person_hasinterest_tag.nrows())
        .max(person + 1);
    let tags = person_hasinterest_tag.ncols().max(tag + 1);
    let knows = widen(&person_knows_person.pattern(), persons, persons).apply(|_| 1u64);

    let start = SparseVector::from_pairs(persons, [(person, 1u64)], |_, v| v)?;
    let friends = ops::vxm(&start, &knows, &PlusTimes)?;
    let tag_vector = SparseVector::from_pairs(tags, [(tag, 1u64)], |_, v| v)?;
    let interested = ops::mxv(
        &widen(person_hasinterest_tag, persons, tags),
        &tag_vector,
        &PlusTimes,
    )?
    .select_complement(&friends.to_mask())
    .select_complement(&Mask::from_indices([person]));
    let candidates = ops::vxm(&friends, &knows, &PlusTimes)?.select(&interested.to_mask())?;

    let neighbours = ops::mxm(&selection(&candidates)?, &knows, &PlusTimes)?;
    let mutual = ops::mxm(&neighbours, &selection(&friends)?, &PlusTimes)?;
    let counts = ops::reduce_rows(&mutual, &Plus);
    debug!(
        friends = friends.nvals(),
        candidates = candidates.nvals(),
        "friend recommendations computed"
    );
    Ok(counts
        .iter()
        .map(|(person, mutual_friends)| MutualFriends {
            person,
            mutual_friends,
        })
        .collect())
}

fn message_rows<T: Scalar>(
    comments: &SparseMatrix<T>,
    posts: &SparseMatrix<T>,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    let mut messages = comments.clone();
    ops::merge_into(&mut messages, posts, Axis::Rows)?;
    Ok(messages)
}

fn message_cols<T: Scalar>(
    comments: &SparseMatrix<T>,
    posts: &SparseMatrix<T>,
) -> Result<SparseMatrix<T>, SnbGraphError> {
    ops::merge(comments, posts, Axis::Columns)
}
