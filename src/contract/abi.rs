//! Call surface of the deployed saysome contract.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug)]
    interface ISaysome {
        event TweetCreated(uint256 indexed id, address indexed author, string content, uint256 timestamp);
        event TweetLiked(uint256 indexed id, address indexed liker);
        event TweetDisliked(uint256 indexed id, address indexed disliker);
        event CommentAdded(uint256 indexed commentId, uint256 indexed tweetId, address indexed author, string content, uint256 timestamp);

        function getTweetCount() external view returns (uint256);

        function getTweets(uint256 offset, uint256 limit) external view returns (
            uint256[] memory ids,
            address[] memory authors,
            string[] memory contents,
            uint256[] memory timestamps,
            uint256[] memory likes,
            uint256[] memory dislikes
        );

        function getTweetComments(uint256 tweetId) external view returns (uint256[] memory);

        function getComment(uint256 commentId) external view returns (
            uint256 id,
            address author,
            string memory content,
            uint256 timestamp
        );

        function createTweet(string memory content) external;
        function likeTweet(uint256 tweetId) external;
        function dislikeTweet(uint256 tweetId) external;
        function addComment(uint256 tweetId, string memory content) external;
    }
}
